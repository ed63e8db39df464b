use crate::error::{AssertionNotFound, AuthError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::warn;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use select::document::Document;
use select::predicate::Attr;

const ASSERTION_NAMESPACE: &[u8] = b"urn:oasis:names:tc:SAML:2.0:assertion";
const ROLE_ATTRIBUTE: &str = "https://aws.amazon.com/SAML/Attributes/Role";

/// One value of the assertion's role attribute, split into its
/// `(principal, role)` halves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAuthorization {
    pub principal_arn: String,
    pub role_arn: String,
}

/// A validated SAML assertion: the base64 blob as the identity provider
/// issued it plus its decoded XML. Lives for one run only.
pub struct SamlAssertion {
    raw: String,
    decoded: String,
}

/// Scans the page for an `<input name="SAMLResponse">` and returns its value
/// attribute. Absence means the server sent a login page instead.
pub fn extract_assertion(html: &str) -> Result<String, AssertionNotFound> {
    let document = Document::from(html);
    let node = document.find(Attr("name", "SAMLResponse")).next();

    node.and_then(|element| element.attr("value"))
        .map(String::from)
        .ok_or(AssertionNotFound)
}

impl SamlAssertion {
    /// Decodes the base64 blob and checks the XML is well-formed. Either
    /// failure is [`AuthError::MalformedAssertion`], the condition that
    /// drives the forms-authentication fallback in the sign-on flow.
    pub fn parse(raw: String) -> Result<SamlAssertion, AuthError> {
        let decoded = BASE64
            .decode(raw.as_bytes())
            .map_err(|e| AuthError::MalformedAssertion(format!("invalid base64: {e}")))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|e| AuthError::MalformedAssertion(format!("assertion is not utf-8: {e}")))?;

        let mut reader = NsReader::from_str(decoded.as_str());
        loop {
            match reader.read_resolved_event() {
                Ok((_, Event::Eof)) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(AuthError::MalformedAssertion(format!("invalid xml: {e}")))
                }
            }
        }

        Ok(SamlAssertion { raw, decoded })
    }

    /// The assertion exactly as it left the identity provider, still base64.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// All `(principal, role)` pairs of the role attribute, in document
    /// order. A value without the `principal,role` shape is skipped with a
    /// warning rather than aborting the parse.
    pub fn role_authorizations(&self) -> Result<Vec<RoleAuthorization>, AuthError> {
        let malformed = |e: &dyn std::fmt::Display| {
            AuthError::MalformedAssertion(format!("invalid xml: {e}"))
        };

        let mut reader = NsReader::from_str(self.decoded.as_str());
        let mut in_role_attribute = false;
        let mut in_value = false;
        let mut current = String::new();
        let mut authorizations = vec![];

        loop {
            let event = reader.read_resolved_event().map_err(|e| malformed(&e))?;

            match event {
                (ResolveResult::Bound(Namespace(ns)), Event::Start(element))
                    if ns == ASSERTION_NAMESPACE =>
                {
                    match element.local_name().as_ref() {
                        b"Attribute" => {
                            let name = element
                                .try_get_attribute("Name")
                                .map_err(|e| malformed(&e))?
                                .map(|attr| attr.unescape_value())
                                .transpose()
                                .map_err(|e| malformed(&e))?;
                            in_role_attribute = name.as_deref() == Some(ROLE_ATTRIBUTE);
                        }
                        b"AttributeValue" if in_role_attribute => {
                            in_value = true;
                            current.clear();
                        }
                        _ => {}
                    }
                }
                (_, Event::Text(text)) if in_value => {
                    current.push_str(text.unescape().map_err(|e| malformed(&e))?.as_ref());
                }
                (ResolveResult::Bound(Namespace(ns)), Event::End(element))
                    if ns == ASSERTION_NAMESPACE =>
                {
                    match element.local_name().as_ref() {
                        b"AttributeValue" if in_value => {
                            in_value = false;
                            match parse_authorization(current.trim()) {
                                Some(authorization) => authorizations.push(authorization),
                                None => warn!(
                                    "skipping role attribute value without a principal,role pair: {:?}",
                                    current.trim()
                                ),
                            }
                        }
                        b"Attribute" => in_role_attribute = false,
                        _ => {}
                    }
                }
                (_, Event::Eof) => break,
                _ => {}
            }
        }

        Ok(authorizations)
    }
}

/// Splits on the first comma; the identity provider puts the principal ARN
/// before the role ARN.
fn parse_authorization(value: &str) -> Option<RoleAuthorization> {
    let (principal_arn, role_arn) = value.split_once(',')?;
    Some(RoleAuthorization {
        principal_arn: principal_arn.trim().to_string(),
        role_arn: role_arn.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRINCIPAL: &str = "arn:aws:iam::123456789012:saml-provider/adfs";
    const ROLE_ONE: &str = "arn:aws:iam::123456789012:role/developer";
    const ROLE_TWO: &str = "arn:aws:iam::210987654321:role/auditor";

    fn login_page(assertion: &str) -> String {
        format!(
            r#"<html><body><form method="post" action="https://signin.aws.amazon.com/saml">
            <input type="hidden" name="SAMLResponse" value="{assertion}"/>
            <input type="submit" value="Continue"/>
            </form></body></html>"#
        )
    }

    fn assertion_xml(values: &[&str]) -> String {
        let values: String = values
            .iter()
            .map(|value| format!("<saml2:AttributeValue>{value}</saml2:AttributeValue>"))
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
                            xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion">
              <saml2:Assertion>
                <saml2:AttributeStatement>
                  <saml2:Attribute Name="https://aws.amazon.com/SAML/Attributes/RoleSessionName">
                    <saml2:AttributeValue>user@corp.example.com</saml2:AttributeValue>
                  </saml2:Attribute>
                  <saml2:Attribute Name="https://aws.amazon.com/SAML/Attributes/Role">{values}</saml2:Attribute>
                </saml2:AttributeStatement>
              </saml2:Assertion>
            </samlp:Response>"#
        )
    }

    fn encode(xml: &str) -> String {
        BASE64.encode(xml.as_bytes())
    }

    #[test]
    fn test_extract_assertion_returns_input_value() {
        let html = login_page("dGhlLWFzc2VydGlvbg==");
        assert_eq!(extract_assertion(&html).unwrap(), "dGhlLWFzc2VydGlvbg==");
    }

    #[test]
    fn test_extract_assertion_without_input_is_not_found() {
        let html = "<html><body><form><input name=\"UserName\"/></form></body></html>";
        assert!(extract_assertion(html).is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_base64() {
        let result = SamlAssertion::parse(String::from("!!! not base64 !!!"));
        assert!(matches!(result, Err(AuthError::MalformedAssertion(_))));
    }

    #[test]
    fn test_parse_rejects_invalid_xml() {
        let result = SamlAssertion::parse(encode("<saml2:Response><unclosed>"));
        assert!(matches!(result, Err(AuthError::MalformedAssertion(_))));
    }

    #[test]
    fn test_role_authorizations_in_document_order() {
        let value_one = format!("{PRINCIPAL},{ROLE_ONE}");
        let value_two = format!("{PRINCIPAL},{ROLE_TWO}");
        let xml = assertion_xml(&[value_one.as_str(), value_two.as_str()]);

        let assertion = SamlAssertion::parse(encode(&xml)).unwrap();
        let authorizations = assertion.role_authorizations().unwrap();

        assert_eq!(
            authorizations,
            vec![
                RoleAuthorization {
                    principal_arn: PRINCIPAL.to_string(),
                    role_arn: ROLE_ONE.to_string(),
                },
                RoleAuthorization {
                    principal_arn: PRINCIPAL.to_string(),
                    role_arn: ROLE_TWO.to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_role_authorizations_is_idempotent() {
        let value = format!("{PRINCIPAL},{ROLE_ONE}");
        let xml = assertion_xml(&[value.as_str()]);
        let assertion = SamlAssertion::parse(encode(&xml)).unwrap();

        let first = assertion.role_authorizations().unwrap();
        let second = assertion.role_authorizations().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_role_authorizations_skips_values_without_comma() {
        let good = format!("{PRINCIPAL},{ROLE_ONE}");
        let xml = assertion_xml(&["no-comma-in-here", good.as_str()]);
        let assertion = SamlAssertion::parse(encode(&xml)).unwrap();

        let authorizations = assertion.role_authorizations().unwrap();
        assert_eq!(authorizations.len(), 1);
        assert_eq!(authorizations[0].role_arn, ROLE_ONE);
    }

    #[test]
    fn test_raw_survives_round_trip() {
        let xml = assertion_xml(&[]);
        let raw = encode(&xml);
        let assertion = SamlAssertion::parse(raw.clone()).unwrap();
        assert_eq!(assertion.raw(), raw);
    }
}
