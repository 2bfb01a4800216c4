//! Form-encoded request envelope.
//!
//! The broker accepts every request as an `application/x-www-form-urlencoded`
//! body: the caller's password, the JSON payload as `json_data`, then any
//! auxiliary fields. Field order is fixed because some broker deployments
//! validate by position as well as by name.

use url::form_urlencoded;

/// Media type of an encoded envelope.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A password-authenticated envelope around one JSON payload.
///
/// Encoding is pure: the same inputs always produce the same body.
#[derive(Debug, Clone)]
pub struct Envelope<'a> {
    password: &'a str,
    json_data: &'a str,
    fields: Vec<(&'a str, &'a str)>,
}

impl<'a> Envelope<'a> {
    /// Creates an envelope with no auxiliary fields.
    pub fn new(password: &'a str, json_data: &'a str) -> Self {
        Self {
            password,
            json_data,
            fields: Vec::new(),
        }
    }

    /// Appends an auxiliary field (e.g. `action`, `cart_name`) after
    /// `json_data`. Fields are emitted in the order they are added.
    #[must_use]
    pub fn with_field(mut self, name: &'a str, value: &'a str) -> Self {
        self.fields.push((name, value));
        self
    }

    /// Encodes the envelope as `password=..&json_data=..[&name=value..]`.
    ///
    /// Each value is percent-encoded exactly once, with spaces as `+`.
    /// An empty payload still yields `json_data=`.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer
            .append_pair("password", self.password)
            .append_pair("json_data", self.json_data);
        for (name, value) in &self.fields {
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn decode(body: &str) -> Vec<(String, String)> {
        form_urlencoded::parse(body.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn encodes_password_then_json_data() {
        let body = Envelope::new("1q2w3e", r#"{"rhlogin":"a b"}"#).encode();
        assert_eq!(
            body,
            "password=1q2w3e&json_data=%7B%22rhlogin%22%3A%22a+b%22%7D"
        );
    }

    #[test]
    fn empty_payload_is_not_omitted() {
        assert_eq!(Envelope::new("pw", "").encode(), "password=pw&json_data=");
    }

    #[test]
    fn auxiliary_fields_follow_in_order() {
        let body = Envelope::new("pw", "{}")
            .with_field("action", "configure")
            .with_field("cart_name", "mysql-5.1")
            .encode();
        assert_eq!(
            body,
            "password=pw&json_data=%7B%7D&action=configure&cart_name=mysql-5.1"
        );
    }

    #[rstest]
    #[case::plain("1q2w3e", r#"{"rhlogin":"toolsjboss@gmail.com","debug":"true"}"#)]
    #[case::reserved_chars("p&ss=w%rd+", r#"{"ssh":"AAAA+/==","note":"a&b=c"}"#)]
    #[case::unicode("pässwörd", r#"{"comment":"ключ \"quoted\""}"#)]
    fn decoding_the_form_returns_the_original_values(
        #[case] password: &str,
        #[case] payload: &str,
    ) {
        let decoded = decode(&Envelope::new(password, payload).encode());
        assert_eq!(
            decoded,
            vec![
                ("password".to_owned(), password.to_owned()),
                ("json_data".to_owned(), payload.to_owned()),
            ]
        );
    }
}
