use crux_core::capability::{Capability, CapabilityContext, Operation};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::MAPS_SEARCH_ENDPOINT;

// Everything except ASCII alphanumerics and - _ . ! ~ * ' ( ) is escaped,
// matching the browser's encodeURIComponent.
const QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Address search URL for the external maps site. The address is always
/// percent-encoded; raw text never reaches the URL.
#[must_use]
pub fn search_url(address: &str) -> String {
    let query = utf8_percent_encode(address, QUERY_SET);
    format!("{MAPS_SEARCH_ENDPOINT}?api=1&query={query}")
}

/// Opens a URL in a new, independent viewing context (browser tab or the
/// platform's default handler). Fire-and-forget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum NavigatorOperation {
    OpenExternal { url: String },
}

impl Operation for NavigatorOperation {
    type Output = ();
}

pub struct Navigator<Ev> {
    context: CapabilityContext<NavigatorOperation, Ev>,
}

impl<Ev> Capability<Ev> for Navigator<Ev> {
    type Operation = NavigatorOperation;
    type MappedSelf<MappedEv> = Navigator<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Navigator::new(self.context.map_event(f))
    }
}

impl<Ev> Navigator<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<NavigatorOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn open_external(&self, url: String) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context
                .notify_shell(NavigatorOperation::OpenExternal { url })
                .await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_spaces_and_commas() {
        let url = search_url(
            "Unit 101, 200 Town Centre Boulevard, Markham, Ontario, Canada, L3R 8H8",
        );
        assert_eq!(
            url,
            "https://www.google.com/maps/search/?api=1&query=Unit%20101%2C%20200%20Town%20Centre%20Boulevard%2C%20Markham%2C%20Ontario%2C%20Canada%2C%20L3R%208H8"
        );
    }

    #[test]
    fn test_search_url_keeps_unreserved_marks() {
        assert_eq!(
            search_url("it's-a_test.(!~*)"),
            "https://www.google.com/maps/search/?api=1&query=it's-a_test.(!~*)"
        );
    }

    #[test]
    fn test_search_url_escapes_url_metacharacters() {
        let url = search_url("a&b=c?d#e/f");
        assert_eq!(
            url,
            "https://www.google.com/maps/search/?api=1&query=a%26b%3Dc%3Fd%23e%2Ff"
        );
    }

    #[test]
    fn test_search_url_encodes_non_ascii() {
        assert_eq!(
            search_url("Königstraße 2"),
            "https://www.google.com/maps/search/?api=1&query=K%C3%B6nigstra%C3%9Fe%202"
        );
    }

    #[test]
    fn test_operation_serialization() {
        let op = NavigatorOperation::OpenExternal {
            url: search_url("somewhere"),
        };
        let json = serde_json::to_string(&op).unwrap();
        let deserialized: NavigatorOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, deserialized);
    }
}
