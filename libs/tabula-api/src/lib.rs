pub mod converter;
pub mod error;
pub mod field;
pub mod flags;
pub mod parse_error;
pub mod schema;
pub mod value;

pub use converter::{ConfigInfo, Converter, ConverterFactory, DynConverter};
pub use error::{ConfigError, ErrorKind};
pub use field::FieldInfo;
pub use flags::ConverterFlags;
pub use parse_error::{ParseError, ParseErrorKind};
pub use schema::{ConverterRef, EnumDomain, FieldDescriptor, FieldType, TypeTag};
pub use value::{EnumValue, Row, Value};
