// Default tag library

mod comment;
mod conditional;
mod debug;
mod loops;
mod markup;
mod now;
mod output;
mod with;

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::template::library::{NodeFactory, TagLibrary};

pub use comment::{CommentNode, CommentNodeFactory};
pub use conditional::{
    Comparison, Condition, IfEqualNode, IfEqualNodeFactory, IfNode, IfNodeFactory,
};
pub use debug::{DebugNode, DebugNodeFactory};
pub use loops::{ForNode, ForNodeFactory};
pub use markup::{AutoescapeNode, AutoescapeNodeFactory, SpacelessNode, SpacelessNodeFactory};
pub use now::{format_datetime, NowNode, NowNodeFactory};
pub use output::{FirstOfNode, FirstOfNodeFactory, TemplateTagNode, TemplateTagNodeFactory};
pub use with::{WithNode, WithNodeFactory};

pub struct DefaultTags;

impl TagLibrary for DefaultTags {
    fn node_factories(&self) -> HashMap<String, Arc<dyn NodeFactory>> {
        let factories: [(&str, Arc<dyn NodeFactory>); 12] = [
            ("comment", Arc::new(CommentNodeFactory)),
            ("now", Arc::new(NowNodeFactory)),
            ("debug", Arc::new(DebugNodeFactory)),
            ("if", Arc::new(IfNodeFactory)),
            ("ifequal", Arc::new(IfEqualNodeFactory { negate: false })),
            ("ifnotequal", Arc::new(IfEqualNodeFactory { negate: true })),
            ("for", Arc::new(ForNodeFactory)),
            ("with", Arc::new(WithNodeFactory)),
            ("firstof", Arc::new(FirstOfNodeFactory)),
            ("templatetag", Arc::new(TemplateTagNodeFactory)),
            ("spaceless", Arc::new(SpacelessNodeFactory)),
            ("autoescape", Arc::new(AutoescapeNodeFactory)),
        ];
        factories
            .into_iter()
            .map(|(name, factory)| (name.to_string(), factory))
            .collect()
    }
}
