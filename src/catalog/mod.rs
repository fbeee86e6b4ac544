pub mod response_type;
pub use response_type::*;

pub mod table_schema;
pub use table_schema::*;

pub mod row_shape;
pub use row_shape::*;

pub mod schema_catalog;
pub use schema_catalog::*;
