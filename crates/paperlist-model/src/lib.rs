//! Data model shared by the paper listing crates.
//!
//! Submissions ([`PaperRow`]), viewers ([`Contact`]), conference settings, the
//! search that produced a listing, and the query options columns use to ask
//! the record store for extra data. Visibility questions go through the
//! [`CapabilityOracle`] trait.

pub mod contact;
pub mod ids;
pub mod oracle;
pub mod paper;
pub mod query;
pub mod search;
pub mod settings;
pub mod tags;
pub mod view_score;

pub use contact::{Contact, Roles};
pub use ids::{ContactId, PaperId};
pub use oracle::{CapabilityOracle, RolePolicy};
pub use paper::{
    Author, CONFLICT_AUTHOR, PaperRow, Preference, REVIEW_EXTERNAL, REVIEW_PC, REVIEW_PRIMARY,
    REVIEW_SECONDARY, ReviewRow,
};
pub use query::{QueryOptions, QueryValue};
pub use search::{LIMIT_AUTHOR, SearchContext};
pub use settings::{ConferenceSettings, ConfigError, Decision, ReviewField, SavedFormula, Topic};
pub use tags::TagValue;
pub use view_score::ViewScore;
