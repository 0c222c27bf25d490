use serde_json::{Map, Value};

/// A single listing. The fields are up to the crawler that produced it.
pub type Expose = Map<String, Value>;

/// Key the registry uses to remember which crawler produced an expose
pub const CRAWLER_KEY: &str = "crawler";

/// Name of the crawler recorded on an expose, if any
pub fn crawler_of(expose: &Expose) -> Option<&str> {
    expose.get(CRAWLER_KEY).and_then(Value::as_str)
}
