pub mod company_detail;
pub mod data_access;
pub mod ranked_companies;
pub mod startup_use_case;

pub use company_detail::{CompanyDetail, CompanyDetailUseCase};
pub use data_access::{ArtifactKey, CoreDatasets, DataAccess};
pub use ranked_companies::{ranked_view, DatasetFilter, PresenceFilter, RankedCompany, RankingViolation};
pub use startup_use_case::{StartupUseCase, ValidatedDatasets};
