//! Pure domain logic for the activity aggregation engine: category
//! policy, session fingerprinting, affected-entity extraction, summary
//! assembly, Russian title generation, error fingerprinting, and the
//! sanitizer. No database, no network — every function here is a
//! deterministic transform over in-memory values.

pub mod category;
pub mod extract;
pub mod fingerprint;
pub mod plural;
pub mod quiescence;
pub mod sanitizer;
pub mod session;
pub mod summary;
pub mod title;

pub use category::{category_for_event_kind, CategoryPolicy};
pub use extract::{extract_affected_entities, AffectedEntities};
pub use fingerprint::error_fingerprint;
pub use plural::plural_form;
pub use quiescence::is_quiescent;
pub use session::session_fingerprint;
pub use summary::build_summary;
pub use title::generate_title;
