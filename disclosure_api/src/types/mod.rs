mod meta;
pub use self::meta::{Meta, PaginatedResponse, Paging};

mod trade;
pub use self::trade::{Asset, Chamber, Issuer, Politician, Trade, TxType};

mod senate;
pub use self::senate::{ReportListing, ReportRow};
