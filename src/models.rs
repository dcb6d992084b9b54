use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Hard cap TMDB enforces on list endpoints; requesting past it returns 422.
pub const MAX_CATALOG_PAGES: u32 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub popularity: f32,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub video: bool,
}

impl MovieSummary {
    /// Year of the release date, or `None` when the date is missing or malformed.
    pub fn release_year(&self) -> Option<i32> {
        release_year(self.release_date.as_deref())
    }

    pub fn rating_label(&self) -> String {
        format!("{:.1}", self.vote_average)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionCompany {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub origin_country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionCountry {
    pub iso_3166_1: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpokenLanguage {
    pub iso_639_1: String,
    pub name: String,
    #[serde(default)]
    pub english_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRef {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastMember {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub popularity: f32,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub video: bool,
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Minutes; 0 or absent means unknown.
    #[serde(default)]
    pub runtime: Option<u32>,
    /// 0 means unknown, per the catalog's convention.
    #[serde(default)]
    pub budget: u64,
    #[serde(default)]
    pub revenue: u64,
    #[serde(default)]
    pub production_companies: Vec<ProductionCompany>,
    #[serde(default)]
    pub production_countries: Vec<ProductionCountry>,
    #[serde(default)]
    pub spoken_languages: Vec<SpokenLanguage>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub belongs_to_collection: Option<CollectionRef>,
    #[serde(default)]
    pub credits: Option<Credits>,
}

impl MovieDetail {
    /// Projects the detail back to the list-row shape so a detail view can
    /// be bookmarked with the same record the list views persist.
    pub fn summary(&self) -> MovieSummary {
        MovieSummary {
            id: self.id,
            title: self.title.clone(),
            original_title: self.original_title.clone(),
            overview: self.overview.clone(),
            poster_path: self.poster_path.clone(),
            backdrop_path: self.backdrop_path.clone(),
            release_date: self.release_date.clone(),
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            popularity: self.popularity,
            genre_ids: self.genres.iter().map(|g| g.id).collect(),
            original_language: self.original_language.clone(),
            adult: self.adult,
            video: self.video,
        }
    }

    pub fn release_year(&self) -> Option<i32> {
        release_year(self.release_date.as_deref())
    }

    pub fn rating_label(&self) -> String {
        format!("{:.1}", self.vote_average)
    }

    pub fn director(&self) -> Option<&CrewMember> {
        self.credits
            .as_ref()
            .and_then(|c| c.crew.iter().find(|m| m.job == "Director"))
    }

    pub fn top_cast(&self, max: usize) -> &[CastMember] {
        let cast = self
            .credits
            .as_ref()
            .map(|c| c.cast.as_slice())
            .unwrap_or(&[]);
        &cast[..cast.len().min(max)]
    }

    pub fn runtime_label(&self) -> Option<String> {
        match self.runtime {
            Some(minutes) if minutes > 0 => {
                Some(format!("{}h {:02}m", minutes / 60, minutes % 60))
            }
            _ => None,
        }
    }
}

/// One page of list results with the catalog's pagination metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct PagedResults {
    pub page: u32,
    pub results: Vec<MovieSummary>,
    pub total_pages: u32,
    pub total_results: u32,
}

impl PagedResults {
    /// Normalizes the wire metadata: the catalog reports the true page count
    /// but rejects requests past page 500, so the usable count is capped.
    pub fn normalize(mut self) -> Self {
        self.total_pages = self.total_pages.min(MAX_CATALOG_PAGES);
        self
    }
}

fn release_year(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.year())
}

pub fn format_grouped(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
