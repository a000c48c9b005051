use serde::{Deserialize, Serialize};

/// Shared-hobby reward: `per_shared` points per common hobby, capped at `max`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HobbyWeights {
    #[serde(alias = "per_shared")]
    pub per_shared: f64,
    pub max: f64,
}

/// Distance bands in kilometers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationWeights {
    #[serde(alias = "within_10")]
    pub within_10: f64,
    #[serde(alias = "within_30")]
    pub within_30: f64,
    #[serde(alias = "within_50")]
    pub within_50: f64,
}

/// Age-difference bands in years
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeWeights {
    #[serde(alias = "within_3")]
    pub within_3: f64,
    #[serde(alias = "within_7")]
    pub within_7: f64,
    #[serde(alias = "within_10")]
    pub within_10: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifestyleWeights {
    pub smoking: f64,
    pub drinking: f64,
    pub children: f64,
}

/// Scoring weights
///
/// `goals` and `children_desire` scale their lookup tables, which are
/// expressed at 15 and 10 respectively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    pub hobbies: HobbyWeights,
    pub location: LocationWeights,
    pub age: AgeWeights,
    pub goals: f64,
    pub gender: f64,
    pub lifestyle: LifestyleWeights,
    #[serde(alias = "children_desire")]
    pub children_desire: f64,
    pub education: f64,
    pub occupation: f64,
}

impl ScoringWeights {
    pub const GOALS_TABLE_SCALE: f64 = 15.0;
    pub const CHILDREN_DESIRE_TABLE_SCALE: f64 = 10.0;

    /// Apply `overrides` on top of these weights
    pub fn merged(&self, overrides: &WeightOverrides) -> Self {
        merge(self, overrides)
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            hobbies: HobbyWeights {
                per_shared: 5.0,
                max: 25.0,
            },
            location: LocationWeights {
                within_10: 15.0,
                within_30: 10.0,
                within_50: 5.0,
            },
            age: AgeWeights {
                within_3: 15.0,
                within_7: 10.0,
                within_10: 5.0,
            },
            goals: 15.0,
            gender: 10.0,
            lifestyle: LifestyleWeights {
                smoking: 5.0,
                drinking: 5.0,
                children: 5.0,
            },
            children_desire: 10.0,
            education: 3.0,
            occupation: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationOverrides {
    #[serde(alias = "within_10")]
    pub within_10: Option<f64>,
    #[serde(alias = "within_30")]
    pub within_30: Option<f64>,
    #[serde(alias = "within_50")]
    pub within_50: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeOverrides {
    #[serde(alias = "within_3")]
    pub within_3: Option<f64>,
    #[serde(alias = "within_7")]
    pub within_7: Option<f64>,
    #[serde(alias = "within_10")]
    pub within_10: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifestyleOverrides {
    pub smoking: Option<f64>,
    pub drinking: Option<f64>,
    pub children: Option<f64>,
}

/// Partial weights. Every field is optional.
///
/// Location, age and lifestyle merge key by key. Every other category
/// replaces the base value wholesale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeightOverrides {
    pub hobbies: Option<HobbyWeights>,
    pub location: Option<LocationOverrides>,
    pub age: Option<AgeOverrides>,
    pub goals: Option<f64>,
    pub gender: Option<f64>,
    pub lifestyle: Option<LifestyleOverrides>,
    #[serde(alias = "children_desire")]
    pub children_desire: Option<f64>,
    pub education: Option<f64>,
    pub occupation: Option<f64>,
}

pub fn merge(base: &ScoringWeights, overrides: &WeightOverrides) -> ScoringWeights {
    let mut merged = *base;

    if let Some(hobbies) = overrides.hobbies {
        merged.hobbies = hobbies;
    }

    if let Some(location) = overrides.location {
        merged.location = LocationWeights {
            within_10: location.within_10.unwrap_or(base.location.within_10),
            within_30: location.within_30.unwrap_or(base.location.within_30),
            within_50: location.within_50.unwrap_or(base.location.within_50),
        };
    }

    if let Some(age) = overrides.age {
        merged.age = AgeWeights {
            within_3: age.within_3.unwrap_or(base.age.within_3),
            within_7: age.within_7.unwrap_or(base.age.within_7),
            within_10: age.within_10.unwrap_or(base.age.within_10),
        };
    }

    if let Some(lifestyle) = overrides.lifestyle {
        merged.lifestyle = LifestyleWeights {
            smoking: lifestyle.smoking.unwrap_or(base.lifestyle.smoking),
            drinking: lifestyle.drinking.unwrap_or(base.lifestyle.drinking),
            children: lifestyle.children.unwrap_or(base.lifestyle.children),
        };
    }

    merged.goals = overrides.goals.unwrap_or(base.goals);
    merged.gender = overrides.gender.unwrap_or(base.gender);
    merged.children_desire = overrides.children_desire.unwrap_or(base.children_desire);
    merged.education = overrides.education.unwrap_or(base.education);
    merged.occupation = overrides.occupation.unwrap_or(base.occupation);

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_overrides_keep_defaults() {
        let base = ScoringWeights::default();
        assert_eq!(merge(&base, &WeightOverrides::default()), base);
    }

    #[test]
    fn test_nested_categories_merge_per_key() {
        let overrides = WeightOverrides {
            location: Some(LocationOverrides {
                within_10: Some(20.0),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = ScoringWeights::default().merged(&overrides);

        assert_eq!(merged.location.within_10, 20.0);
        assert_eq!(merged.location.within_30, 10.0);
        assert_eq!(merged.location.within_50, 5.0);
    }

    #[test]
    fn test_hobbies_replace_wholesale() {
        let overrides: WeightOverrides =
            serde_json::from_str(r#"{"hobbies": {"perShared": 2, "max": 10}, "education": 0}"#).unwrap();

        let merged = ScoringWeights::default().merged(&overrides);

        assert_eq!(merged.hobbies, HobbyWeights { per_shared: 2.0, max: 10.0 });
        assert_eq!(merged.education, 0.0);
        assert_eq!(merged.occupation, 2.0);
    }
}
