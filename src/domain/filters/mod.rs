// Default filter library

mod logic;
mod sequence;
mod text;

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::template::library::TagLibrary;
use crate::domain::template::pipeline::Filter;

pub use logic::{DefaultFilter, DefaultIfNoneFilter, YesNoFilter};
pub use sequence::{FirstFilter, JoinFilter, LastFilter, LengthFilter, SliceFilter};
pub use text::{
    CapFirstFilter, CutFilter, EscapeFilter, LowerFilter, RemoveTagsFilter, SafeFilter,
    TruncateWordsFilter, UpperFilter, UrlEncodeFilter,
};

pub struct DefaultFilters;

impl TagLibrary for DefaultFilters {
    fn filters(&self) -> HashMap<String, Arc<dyn Filter>> {
        let filters: [(&str, Arc<dyn Filter>); 17] = [
            ("upper", Arc::new(UpperFilter)),
            ("lower", Arc::new(LowerFilter)),
            ("capfirst", Arc::new(CapFirstFilter)),
            ("yesno", Arc::new(YesNoFilter)),
            ("truncatewords", Arc::new(TruncateWordsFilter)),
            ("join", Arc::new(JoinFilter)),
            ("removetags", Arc::new(RemoveTagsFilter)),
            ("default", Arc::new(DefaultFilter)),
            ("default_if_none", Arc::new(DefaultIfNoneFilter)),
            ("cut", Arc::new(CutFilter)),
            ("slice", Arc::new(SliceFilter)),
            ("safe", Arc::new(SafeFilter)),
            ("escape", Arc::new(EscapeFilter)),
            ("urlencode", Arc::new(UrlEncodeFilter)),
            ("length", Arc::new(LengthFilter)),
            ("first", Arc::new(FirstFilter)),
            ("last", Arc::new(LastFilter)),
        ];
        filters
            .into_iter()
            .map(|(name, filter)| (name.to_string(), filter))
            .collect()
    }
}
