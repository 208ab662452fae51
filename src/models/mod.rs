//! Domain models and wire DTOs.

mod reference;
mod role;
mod sample;
mod status;
mod user;

pub use reference::{NewProductionLine, NewSampleType, ProductionLine, SampleType};
pub use role::Role;
pub use sample::{NewSample, Sample, SampleResult};
pub use status::SampleStatus;
pub use user::{LoginRequest, LoginResponse, NewUser, User, UserUpdate};

use serde::{Deserialize, Deserializer};

/// Accept a JSON string or number and normalize to a string.
///
/// The backend stores user identifiers inconsistently: the registration
/// form submits them as strings while the admin form parses them to
/// integers first. Everything downstream compares them as strings.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
