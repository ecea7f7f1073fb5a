//! XML-RPC wire format used by [`HttpTransport`](crate::http::HttpTransport).
//!
//! Requests are written by hand (the format is tiny and fixed); responses are
//! read with `quick-xml` into a small element tree and then interpreted.

use crate::encoding::lookup_encoding;
use crate::error::{MetaWeblogError, Result};
use crate::request::RpcCall;
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime};
use encoding_rs::Encoding;
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

const DATETIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// Serializes `call` as a `<methodCall>` document declaring `encoding`.
pub fn encode_call(call: &RpcCall, encoding: &str) -> String {
    let mut out = format!(
        "<?xml version=\"1.0\" encoding=\"{}\"?>\n<methodCall><methodName>{}</methodName><params>",
        encoding.trim(),
        escape(call.method)
    );
    for param in &call.params {
        out.push_str("<param>");
        write_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>\n");
    out
}

/// Serializes `call` and encodes the document in `encoding`.
///
/// Characters the charset cannot hold are written as numeric character
/// references, which any XML parser resolves back.
pub fn encode_document(call: &RpcCall, encoding: &str) -> Result<Vec<u8>> {
    let target = lookup_encoding(encoding)?;
    let xml = encode_call(call, encoding);
    let (bytes, _, had_unmappable) = target.encode(&xml);
    if had_unmappable {
        debug!(
            "{} request contains characters outside {}; sent as character references",
            call.method,
            target.name()
        );
    }
    Ok(bytes.into_owned())
}

fn write_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Int(i) => out.push_str(&format!("<int>{i}</int>")),
        Value::Bool(b) => out.push_str(if *b {
            "<boolean>1</boolean>"
        } else {
            "<boolean>0</boolean>"
        }),
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Double(d) => out.push_str(&format!("<double>{d}</double>")),
        Value::DateTime(dt) => out.push_str(&format!(
            "<dateTime.iso8601>{}</dateTime.iso8601>",
            dt.format(DATETIME_FORMAT)
        )),
        Value::Base64(b) => {
            out.push_str("<base64>");
            out.push_str(b);
            out.push_str("</base64>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
        Value::Nil => out.push_str("<nil/>"),
    }
    out.push_str("</value>");
}

/// Decodes a response body into text.
///
/// The charset comes from the HTTP header if given, then a BOM, then the XML
/// declaration, and finally defaults to UTF-8.
pub fn decode_document(body: &[u8], header_charset: Option<&str>) -> Result<String> {
    let (encoding, body) = match Encoding::for_bom(body) {
        Some((bom_encoding, bom_len)) if header_charset.is_none() => {
            (bom_encoding, &body[bom_len..])
        }
        _ => {
            let label = header_charset.or_else(|| declared_encoding(body));
            let encoding = label
                .and_then(|l| Encoding::for_label(l.trim().as_bytes()))
                .unwrap_or(encoding_rs::UTF_8);
            (encoding, body)
        }
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            MetaWeblogError::protocol_error(format!(
                "response body is not valid {}",
                encoding.name()
            ))
        })
}

/// Reads `encoding="..."` from an XML declaration.
fn declared_encoding(body: &[u8]) -> Option<&str> {
    let head = body.strip_prefix(b"<?xml")?;
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&head[..end]).ok()?;
    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &rest[1..];
    Some(&rest[..rest.find(quote)?])
}

/// Parses a `<methodResponse>` document.
///
/// A `<fault>` becomes [`MetaWeblogError::RemoteFault`]; anything that is not
/// a well-formed response becomes [`MetaWeblogError::Protocol`].
pub fn decode_response(xml: &str) -> Result<Value> {
    let root = parse_tree(xml)?;
    if root.name != "methodResponse" {
        return Err(MetaWeblogError::protocol_error(format!(
            "expected <methodResponse>, found <{}>",
            root.name
        )));
    }

    let body = root
        .children
        .first()
        .ok_or_else(|| MetaWeblogError::protocol_error("empty <methodResponse>"))?;

    match body.name.as_str() {
        "params" => match body.children.first() {
            Some(param) => parse_value(param.child("value")?),
            None => Ok(Value::Nil),
        },
        "fault" => Err(parse_fault(body)?),
        other => Err(MetaWeblogError::protocol_error(format!(
            "unexpected <{other}> in <methodResponse>"
        ))),
    }
}

fn parse_fault(fault: &Node) -> Result<MetaWeblogError> {
    let value = parse_value(fault.child("value")?)?;

    let code = match value.get("faultCode") {
        Some(Value::Int(code)) => *code,
        Some(Value::String(code)) => code.trim().parse().map_err(|_| {
            MetaWeblogError::protocol_error(format!("non-numeric faultCode `{code}`"))
        })?,
        _ => return Err(MetaWeblogError::protocol_error("fault without faultCode")),
    };
    let message = value
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(MetaWeblogError::from_fault(code, message))
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn named(start: &BytesStart<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Default::default()
        }
    }

    fn child(&self, name: &str) -> Result<&Node> {
        self.children
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| {
                MetaWeblogError::protocol_error(format!("<{}> without <{name}>", self.name))
            })
    }
}

fn parse_tree(xml: &str) -> Result<Node> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Node::default()];

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Node::named(&start)),
            Event::Empty(start) => current(&mut stack)?.children.push(Node::named(&start)),
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(MetaWeblogError::protocol_error("unbalanced closing tag"));
                }
                let node = stack.pop().unwrap_or_default();
                current(&mut stack)?.children.push(node);
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                current(&mut stack)?.text.push_str(&text);
            }
            Event::CData(cdata) => {
                let bytes = cdata.into_inner();
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| MetaWeblogError::protocol_error(e.to_string()))?;
                current(&mut stack)?.text.push_str(text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(MetaWeblogError::protocol_error("unexpected end of document"));
    }

    stack
        .pop()
        .and_then(|root| root.children.into_iter().next())
        .ok_or_else(|| MetaWeblogError::protocol_error("empty response document"))
}

fn current(stack: &mut [Node]) -> Result<&mut Node> {
    stack
        .last_mut()
        .ok_or_else(|| MetaWeblogError::protocol_error("element outside document"))
}

fn parse_value(node: &Node) -> Result<Value> {
    let typed = match node.children.as_slice() {
        [] => return Ok(Value::String(node.text.clone())),
        [typed] => typed,
        _ => {
            return Err(MetaWeblogError::protocol_error(
                "<value> with more than one type",
            ));
        }
    };

    let text = typed.text.trim();
    match typed.name.as_str() {
        "int" | "i4" | "i8" => text
            .parse::<i64>()
            .ok()
            .and_then(|i| i32::try_from(i).ok())
            .map(Value::Int)
            .ok_or_else(|| invalid(&typed.name, text)),
        "boolean" => match text {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            _ => Err(invalid("boolean", text)),
        },
        "string" => Ok(Value::String(typed.text.clone())),
        "double" => text
            .parse()
            .map(Value::Double)
            .map_err(|_| invalid("double", text)),
        "dateTime.iso8601" => parse_datetime(text)
            .map(Value::DateTime)
            .ok_or_else(|| invalid("dateTime.iso8601", text)),
        "base64" => Ok(Value::Base64(
            text.chars().filter(|c| !c.is_whitespace()).collect(),
        )),
        "nil" => Ok(Value::Nil),
        "array" => typed
            .child("data")?
            .children
            .iter()
            .filter(|c| c.name == "value")
            .map(parse_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        "struct" => typed
            .children
            .iter()
            .filter(|c| c.name == "member")
            .map(|member| {
                let name = member.child("name")?.text.clone();
                Ok((name, parse_value(member.child("value")?)?))
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Struct),
        other => Err(MetaWeblogError::protocol_error(format!(
            "unknown value type <{other}>"
        ))),
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    ["%Y%m%dT%H:%M:%S", "%Y%m%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

fn invalid(kind: &str, text: &str) -> MetaWeblogError {
    MetaWeblogError::protocol_error(format!("invalid <{kind}> value `{text}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn response(value: &str) -> String {
        format!(
            "<?xml version=\"1.0\"?>\n<methodResponse>\n  <params>\n    <param>\n      <value>{value}</value>\n    </param>\n  </params>\n</methodResponse>\n"
        )
    }

    #[test]
    fn test_encode_call_layout() {
        let call = RpcCall::new(
            "metaWeblog.getRecentPosts",
            vec![Value::Int(0), Value::from("admin"), Value::Nil, Value::Bool(true)],
        );
        let xml = encode_call(&call, "UTF-8");

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<methodName>metaWeblog.getRecentPosts</methodName>"));
        assert!(xml.contains(
            "<params><param><value><int>0</int></value></param>\
             <param><value><string>admin</string></value></param>\
             <param><value><nil/></value></param>\
             <param><value><boolean>1</boolean></value></param></params>"
        ));
    }

    #[test]
    fn test_encode_escapes_markup_and_tags_base64() {
        let call = RpcCall::new(
            "metaWeblog.newMediaObject",
            vec![Value::structure([
                ("name", Value::from("a&b<c>.png")),
                ("bits", Value::Base64("aGVsbG8=".into())),
            ])],
        );
        let xml = encode_call(&call, "UTF-8");

        assert!(xml.contains("<name>name</name><value><string>a&amp;b&lt;c&gt;.png</string></value>"));
        assert!(xml.contains("<name>bits</name><value><base64>aGVsbG8=</base64></value>"));
    }

    #[test]
    fn test_encode_document_uses_target_charset() {
        let call = RpcCall::new("x", vec![Value::from("é ☃")]);
        let bytes = encode_document(&call, "ISO-8859-1").unwrap();

        // é fits in Latin-1, the snowman becomes a character reference
        let needle: &[u8] = b"<string>\xe9 &#9731;</string>";
        assert!(bytes.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode_response(&response("<int>42</int>")).unwrap(), Value::Int(42));
        assert_eq!(decode_response(&response("<i4>-7</i4>")).unwrap(), Value::Int(-7));
        assert_eq!(
            decode_response(&response("<boolean>1</boolean>")).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            decode_response(&response("<double>1.5</double>")).unwrap(),
            Value::Double(1.5)
        );
        assert_eq!(
            decode_response(&response("untyped &amp; raw")).unwrap(),
            Value::from("untyped & raw")
        );
        assert_eq!(
            decode_response(&response("<string> padded </string>")).unwrap(),
            Value::from(" padded ")
        );
        assert_eq!(
            decode_response(&response("<string><![CDATA[<b>]]></string>")).unwrap(),
            Value::from("<b>")
        );
        assert_eq!(decode_response(&response("<nil/>")).unwrap(), Value::Nil);
    }

    #[test]
    fn test_decode_recent_posts() {
        let xml = response(
            "<array><data>\
               <value><struct>\
                 <member><name>postid</name><value><string>1</string></value></member>\
                 <member><name>dateCreated</name><value><dateTime.iso8601>20240301T12:30:00</dateTime.iso8601></value></member>\
                 <member><name>categories</name><value><array><data><value><string>Uncategorized</string></value></data></array></value></member>\
                 <member><name>post_status</name><value><string>publish</string></value></member>\
               </struct></value>\
             </data></array>",
        );

        let value = decode_response(&xml).unwrap();
        let posts = value.as_array().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].get("postid"), Some(&Value::from("1")));
        assert_eq!(posts[0].get("post_status"), Some(&Value::from("publish")));
        assert_eq!(
            posts[0].get("dateCreated"),
            Some(&Value::DateTime(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .and_then(|d| d.and_hms_opt(12, 30, 0))
                    .unwrap()
            ))
        );
        assert_eq!(
            posts[0].get("categories"),
            Some(&Value::from(vec!["Uncategorized"]))
        );
    }

    #[test]
    fn test_decode_fault() {
        let xml = "<?xml version=\"1.0\"?>
<methodResponse>
  <fault>
    <value>
      <struct>
        <member><name>faultCode</name><value><int>403</int></value></member>
        <member><name>faultString</name><value><string>Incorrect username or password.</string></value></member>
      </struct>
    </value>
  </fault>
</methodResponse>";

        let err = decode_response(xml).unwrap_err();
        assert_eq!(
            err,
            MetaWeblogError::from_fault(403, "Incorrect username or password.")
        );
    }

    #[test]
    fn test_decode_malformed() {
        let cases = [
            "",
            "not xml at all",
            "<methodResponse><params><param><value><int>1</int></value></param></params>",
            "<html><body>502 Bad Gateway</body></html>",
            "<methodResponse><params><param><value><int>abc</int></value></param></params></methodResponse>",
            "<methodResponse><params><param><value><blob>x</blob></value></param></params></methodResponse>",
            "<methodResponse><fault><value><struct></struct></value></fault></methodResponse>",
        ];

        for case in cases {
            let err = decode_response(case).unwrap_err();
            assert!(
                matches!(err, MetaWeblogError::Protocol { .. }),
                "{case:?} -> {err:?}"
            );
        }
    }

    #[test]
    fn test_round_trip_through_codec() {
        let original = Value::structure([
            ("title", Value::from("Fish &amp; Chips")),
            ("count", Value::Int(3)),
            ("tags", Value::from(vec!["a", "b"])),
            ("bits", Value::Base64("AAEC".into())),
            ("none", Value::Nil),
        ]);
        let call = RpcCall::new("echo", vec![original.clone()]);
        let request = encode_call(&call, "UTF-8");

        let echoed = request
            .replace("<methodCall>", "<methodResponse>")
            .replace("</methodCall>", "</methodResponse>")
            .replace("<methodName>echo</methodName>", "");
        assert_eq!(decode_response(&echoed).unwrap(), original);
    }

    #[test]
    fn test_decode_document_charsets() {
        let latin1 = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><x>caf\xe9</x>";
        assert!(decode_document(latin1, None).unwrap().ends_with("<x>café</x>"));
        assert!(
            decode_document(b"<x>caf\xe9</x>", Some("iso-8859-1"))
                .unwrap()
                .ends_with("café</x>")
        );
        assert!(matches!(
            decode_document(b"<x>caf\xe9</x>", None),
            Err(MetaWeblogError::Protocol { .. })
        ));
        assert_eq!(
            decode_document(b"\xef\xbb\xbf<x/>", None).unwrap(),
            "<x/>"
        );
    }
}
