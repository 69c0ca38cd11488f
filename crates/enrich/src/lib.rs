pub mod discovery;
pub mod subject;

pub use discovery::{DiscoveredPerson, associates_from_finding, expand_discoveries};
pub use subject::{
    Subject, SubjectResult, enrich_organization, enrich_person, enrich_subjects,
};
