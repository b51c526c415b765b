pub mod builder;
pub mod filter;
pub mod statement;

pub use builder::{
    ChangesetQuery, contributor_count_query, data_quality_query, history_query,
    users_contributions_query,
};
pub use filter::{any_array_filter, hashtag_filter, timestamp_filter};
pub use statement::{SqlFragment, SqlParam, Statement, StatementBuilder};
