use serde::{Deserialize, Serialize};

/// Traveller population an origin breakdown describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TravellerCategory {
    /// Overnight stays.
    Tourists,
    DayVisitors,
}

impl TravellerCategory {
    pub const ALL: [Self; 2] = [Self::Tourists, Self::DayVisitors];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Tourists => "tourists",
            Self::DayVisitors => "day_visitors",
        }
    }

    #[must_use]
    pub const fn unit_label(self) -> &'static str {
        match self {
            Self::Tourists => "nuitées",
            Self::DayVisitors => "présences",
        }
    }

    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Tourists => "Origine des touristes",
            Self::DayVisitors => "Origine des excursionnistes",
        }
    }
}

/// Geographic granularity of an origin breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OriginDimension {
    Department,
    Region,
    Country,
}

impl OriginDimension {
    pub const ALL: [Self; 3] = [Self::Department, Self::Region, Self::Country];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Department => "department",
            Self::Region => "region",
            Self::Country => "country",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Department => "Départements",
            Self::Region => "Régions",
            Self::Country => "Pays",
        }
    }
}

/// One ranked row of an origin breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginEntry {
    pub name: String,
    pub current_value: f64,
    pub prior_year_value: f64,
}

impl OriginEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, current_value: f64, prior_year_value: f64) -> Self {
        Self {
            name: name.into(),
            current_value,
            prior_year_value,
        }
    }
}

/// Department/region/country breakdowns of one category; each may be absent
/// independently when its request failed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub by_department: Option<Vec<OriginEntry>>,
    pub by_region: Option<Vec<OriginEntry>>,
    pub by_country: Option<Vec<OriginEntry>>,
}

impl CategoryBreakdown {
    #[must_use]
    pub fn get(&self, dimension: OriginDimension) -> Option<&[OriginEntry]> {
        match dimension {
            OriginDimension::Department => self.by_department.as_deref(),
            OriginDimension::Region => self.by_region.as_deref(),
            OriginDimension::Country => self.by_country.as_deref(),
        }
    }

    pub fn set(&mut self, dimension: OriginDimension, entries: Option<Vec<OriginEntry>>) {
        match dimension {
            OriginDimension::Department => self.by_department = entries,
            OriginDimension::Region => self.by_region = entries,
            OriginDimension::Country => self.by_country = entries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OriginBreakdowns {
    pub tourists: CategoryBreakdown,
    pub day_visitors: CategoryBreakdown,
}

impl OriginBreakdowns {
    #[must_use]
    pub fn category(&self, category: TravellerCategory) -> &CategoryBreakdown {
        match category {
            TravellerCategory::Tourists => &self.tourists,
            TravellerCategory::DayVisitors => &self.day_visitors,
        }
    }

    pub fn category_mut(&mut self, category: TravellerCategory) -> &mut CategoryBreakdown {
        match category {
            TravellerCategory::Tourists => &mut self.tourists,
            TravellerCategory::DayVisitors => &mut self.day_visitors,
        }
    }

    #[must_use]
    pub fn get(
        &self,
        category: TravellerCategory,
        dimension: OriginDimension,
    ) -> Option<&[OriginEntry]> {
        self.category(category).get(dimension)
    }
}

/// Per-dimension row limits for origin breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginLimits {
    pub department: usize,
    pub region: usize,
    pub country: usize,
}

impl OriginLimits {
    #[must_use]
    pub const fn new(department: usize, region: usize, country: usize) -> Self {
        Self {
            department,
            region,
            country,
        }
    }

    /// Rows shown per panel.
    #[must_use]
    pub const fn rendered() -> Self {
        Self::new(15, 5, 5)
    }

    /// Rows asked from the backend.
    #[must_use]
    pub const fn requested() -> Self {
        Self::new(15, 10, 10)
    }

    #[must_use]
    pub const fn get(self, dimension: OriginDimension) -> usize {
        match dimension {
            OriginDimension::Department => self.department,
            OriginDimension::Region => self.region,
            OriginDimension::Country => self.country,
        }
    }

    #[must_use]
    pub const fn has_zero(self) -> bool {
        self.department == 0 || self.region == 0 || self.country == 0
    }
}
