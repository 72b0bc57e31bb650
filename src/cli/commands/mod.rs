pub mod inspect;
pub mod shrink;
pub mod trial;

pub use inspect::*;
pub use shrink::*;
pub use trial::*;

use crate::core::DocumentFormat;
use anyhow::Result;

pub(crate) fn parse_format(tag: Option<&str>) -> Result<Option<DocumentFormat>> {
    tag.map(|tag| tag.parse::<DocumentFormat>())
        .transpose()
        .map_err(Into::into)
}
