use serde::Serialize;
use serde_json::Value;

/// Names a required field, optionally one level deep (`"address.city"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub path: &'static str,
    pub label: &'static str,
}

impl FieldDescriptor {
    pub const fn new(path: &'static str, label: &'static str) -> Self {
        Self { path, label }
    }

    fn resolve<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        match self.path.split_once('.') {
            Some((parent, child)) => record.get(parent).and_then(|nested| nested.get(child)),
            None => record.get(self.path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessTier {
    Insufficient,
    Partial,
    Complete,
}

impl ReadinessTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Insufficient => "Insufficient",
            Self::Partial => "Partial",
            Self::Complete => "Complete",
        }
    }
}

/// Lower bounds (inclusive) for the partial and complete tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierThresholds {
    pub partial: u8,
    pub complete: u8,
}

impl TierThresholds {
    pub const fn tier(&self, score: u8) -> ReadinessTier {
        if score >= self.complete {
            ReadinessTier::Complete
        } else if score >= self.partial {
            ReadinessTier::Partial
        } else {
            ReadinessTier::Insufficient
        }
    }
}

/// Tiers for a single category.
pub const CATEGORY_THRESHOLDS: TierThresholds = TierThresholds {
    partial: 50,
    complete: 80,
};

/// Tiers for the averaged overall score. The partial floor differs from the
/// per-category one and is kept as-is pending product clarification.
pub const OVERALL_THRESHOLDS: TierThresholds = TierThresholds {
    partial: 60,
    complete: 80,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub score: u8,
    pub missing_fields: Vec<&'static str>,
    pub status: ReadinessTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverallScore {
    pub score: u8,
    pub status: ReadinessTier,
}

/// Null, empty strings, and empty arrays count as absent.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

/// `round(100 * present / required)`, rounding halves up.
pub fn percentage(present: usize, required: usize) -> u8 {
    if required == 0 {
        return 100;
    }
    let present = present.min(required);
    ((200 * present + required) / (2 * required)) as u8
}

/// Score `record` against `fields`. An absent or non-object record scores zero.
pub fn score_fields(record: Option<&Value>, fields: &[FieldDescriptor]) -> CategoryScore {
    let record = record.filter(|value| value.is_object());

    let missing_fields: Vec<&'static str> = fields
        .iter()
        .filter(|field| !is_present(record.and_then(|value| field.resolve(value))))
        .map(|field| field.label)
        .collect();

    let score = percentage(fields.len() - missing_fields.len(), fields.len());
    CategoryScore {
        score,
        missing_fields,
        status: CATEGORY_THRESHOLDS.tier(score),
    }
}

/// Unweighted mean of category scores, rounded half up.
pub fn aggregate<I>(scores: I) -> OverallScore
where
    I: IntoIterator<Item = u8>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0usize, 0usize), |(sum, count), score| {
            (sum + usize::from(score), count + 1)
        });

    let score = if count == 0 {
        0
    } else {
        ((2 * sum + count) / (2 * count)) as u8
    };

    OverallScore {
        score,
        status: OVERALL_THRESHOLDS.tier(score),
    }
}
