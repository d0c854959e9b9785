//! Line classification for the disassembly parser: turns one textual
//! line into a structured description of a type, method, or field
//! header.

use super::generics::strip_generic_prefix;

const MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "abstract",
    "final",
    "static",
    "synchronized",
    "native",
    "transient",
    "volatile",
];

/// Splits leading modifier keywords off a line's tokens, returning
/// `(modifiers, rest)`.
fn split_modifiers(tokens: &[&str]) -> (Vec<&'static str>, &[&str]) {
    let mut mods = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match MODIFIERS.iter().find(|&&m| m == tokens[i]) {
            Some(&m) => {
                mods.push(m);
                i += 1;
            }
            None => break,
        }
    }
    (mods, &tokens[i..])
}

/// A parsed type header line: `(class|interface) NAME [extends X] [implements Y, ...]`.
#[derive(Debug, PartialEq, Eq)]
pub struct TypeLine {
    pub modifiers: Vec<&'static str>,
    pub is_interface: bool,
    pub name: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
}

/// Recognizes a type header line. The line must contain the `class` or
/// `interface` keyword and end with `{`.
pub fn parse_type_line(line: &str) -> Option<TypeLine> {
    let line = line.trim().strip_suffix('{')?.trim();
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (modifiers, rest) = split_modifiers(&tokens);
    let kind_pos = rest.iter().position(|&t| t == "class" || t == "interface")?;
    let is_interface = rest[kind_pos] == "interface";
    let after_kind_text = rest[kind_pos + 1..].join(" ");
    let name_end = after_kind_text
        .find(|c: char| c == '<' || c.is_whitespace())
        .unwrap_or(after_kind_text.len());
    let name = after_kind_text[..name_end].to_owned();
    // Declared type parameters (`<T extends ...>`) are stripped to their
    // bare names before the remainder (extends/implements) is parsed.
    let (_type_params, rest_text) = strip_generic_prefix(after_kind_text[name_end..].trim_start());

    let super_class = rest_text.find("extends ").map(|idx| {
        let after = &rest_text[idx + "extends ".len()..];
        let end = after.find(" implements").unwrap_or(after.len());
        after[..end].trim().to_owned()
    });

    let interfaces = if let Some(idx) = rest_text.find("implements ") {
        let after = &rest_text[idx + "implements ".len()..];
        after
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        Vec::new()
    };

    Some(TypeLine {
        modifiers,
        is_interface,
        name,
        super_class,
        interfaces,
    })
}

/// A parsed method header line.
#[derive(Debug, PartialEq, Eq)]
pub struct MethodLine {
    pub modifiers: Vec<&'static str>,
    pub return_type: Option<String>,
    pub name: String,
    pub params: Vec<String>,
    pub throws: Vec<String>,
    pub is_constructor: bool,
}

/// Recognizes a method header line: `<return> <name>(<params>) [throws <list>];`.
/// Constructors omit the return type; a bare `static {};` denotes the
/// static initializer.
pub fn parse_method_line(line: &str, class_simple_name: &str) -> Option<MethodLine> {
    let line = line.trim().strip_suffix(';')?;
    if line == "static {}" {
        return Some(MethodLine {
            modifiers: vec!["static"],
            return_type: None,
            name: "<clinit>".to_owned(),
            params: Vec::new(),
            throws: Vec::new(),
            is_constructor: false,
        });
    }
    let open = line.find('(')?;
    let close = line.rfind(')')?;
    if close < open {
        return None;
    }
    let head = line[..open].trim();
    let params_str = &line[open + 1..close];
    let tail = line[close + 1..].trim();

    let (throws, tail_ok) = if let Some(list) = tail.strip_prefix("throws ") {
        (
            list.split(',').map(|s| s.trim().to_owned()).collect(),
            true,
        )
    } else {
        (Vec::new(), tail.is_empty())
    };
    if !tail_ok {
        return None;
    }

    let tokens: Vec<&str> = head.split_whitespace().collect();
    let (modifiers, rest) = split_modifiers(&tokens);
    let rest_text = rest.join(" ");
    // A generic method declares its type parameters (`<T> T foo(T)`) before
    // the return type; strip them to their bare names before matching the
    // remaining return-type/name arity.
    let (_type_params, rest_text) = strip_generic_prefix(&rest_text);
    let rest: Vec<&str> = rest_text.split_whitespace().collect();
    let (return_type, name, is_constructor) = match rest.len() {
        1 => (None, rest[0].to_owned(), rest[0] == class_simple_name),
        2 => (Some(rest[0].to_owned()), rest[1].to_owned(), false),
        _ => return None,
    };

    let params = if params_str.trim().is_empty() {
        Vec::new()
    } else {
        split_params(params_str)
    };

    Some(MethodLine {
        modifiers,
        return_type,
        name,
        params,
        throws,
        is_constructor,
    })
}

/// Splits a parameter-type list on commas that are not inside a generic
/// `<...>` group.
fn split_params(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim().to_owned());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim().to_owned());
    parts
}

/// A parsed field header line: `<type> <name>;`.
#[derive(Debug, PartialEq, Eq)]
pub struct FieldLine {
    pub modifiers: Vec<&'static str>,
    pub field_type: String,
    pub name: String,
}

/// Recognizes a field header line. Must not contain parentheses (those
/// are method lines) and must end with `;`.
pub fn parse_field_line(line: &str) -> Option<FieldLine> {
    let line = line.trim().strip_suffix(';')?;
    if line.contains('(') {
        return None;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (modifiers, rest) = split_modifiers(&tokens);
    if rest.len() < 2 {
        return None;
    }
    let name = (*rest.last()?).to_owned();
    let field_type = rest[..rest.len() - 1].join(" ");
    Some(FieldLine {
        modifiers,
        field_type,
        name,
    })
}

/// Whether `name` denotes a compiler-synthesized construct that is never
/// part of the API: bridge/accessor methods (`access$100`), the
/// class-literal helper (`class$...`), and captured-outer-instance
/// fields (`this$0`, `val$...`).
#[must_use]
pub fn is_synthetic_construct(name: &str) -> bool {
    if name.starts_with("access$") && name["access$".len()..].chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    name.starts_with("class$") || name.starts_with("this$") || name.starts_with("val$")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_class_header() {
        let parsed = parse_type_line(
            "public abstract class com.acme.Widget extends com.acme.Base implements com.acme.Sized, com.acme.Named {",
        )
        .expect("should parse");
        assert_eq!(parsed.name, "com.acme.Widget");
        assert!(!parsed.is_interface);
        assert_eq!(parsed.super_class.as_deref(), Some("com.acme.Base"));
        assert_eq!(parsed.interfaces, vec!["com.acme.Sized", "com.acme.Named"]);
        assert!(parsed.modifiers.contains(&"public"));
        assert!(parsed.modifiers.contains(&"abstract"));
    }

    #[test]
    fn strips_generic_type_parameters_from_a_class_header() {
        let parsed = parse_type_line(
            "public class com.acme.Box<T extends java.lang.Comparable<T>> extends java.lang.Object {",
        )
        .expect("should parse");
        assert_eq!(parsed.name, "com.acme.Box");
        assert_eq!(parsed.super_class.as_deref(), Some("java.lang.Object"));
    }

    #[test]
    fn parses_an_interface_header_with_no_supers() {
        let parsed = parse_type_line("interface com.acme.Marker {").expect("should parse");
        assert!(parsed.is_interface);
        assert!(parsed.super_class.is_none());
        assert!(parsed.interfaces.is_empty());
    }

    #[test]
    fn parses_a_constructor() {
        let parsed = parse_method_line("public Widget(int, java.lang.String);", "Widget")
            .expect("should parse");
        assert!(parsed.is_constructor);
        assert!(parsed.return_type.is_none());
        assert_eq!(parsed.params, vec!["int", "java.lang.String"]);
    }

    #[test]
    fn parses_a_method_with_throws() {
        let parsed = parse_method_line(
            "public void setName(java.lang.String) throws java.io.IOException;",
            "Widget",
        )
        .expect("should parse");
        assert!(!parsed.is_constructor);
        assert_eq!(parsed.return_type.as_deref(), Some("void"));
        assert_eq!(parsed.name, "setName");
        assert_eq!(parsed.throws, vec!["java.io.IOException"]);
    }

    #[test]
    fn strips_generic_type_parameters_from_a_method_header() {
        let parsed = parse_method_line("public <T> T identity(T);", "Widget").expect("should parse");
        assert!(!parsed.is_constructor);
        assert_eq!(parsed.return_type.as_deref(), Some("T"));
        assert_eq!(parsed.name, "identity");
        assert_eq!(parsed.params, vec!["T"]);
    }

    #[test]
    fn parses_static_initializer() {
        let parsed = parse_method_line("static {};", "Widget").expect("should parse");
        assert_eq!(parsed.name, "<clinit>");
    }

    #[test]
    fn parses_a_field() {
        let parsed = parse_field_line("public static final int VERSION;").expect("should parse");
        assert_eq!(parsed.field_type, "int");
        assert_eq!(parsed.name, "VERSION");
        assert!(parsed.modifiers.contains(&"static"));
        assert!(parsed.modifiers.contains(&"final"));
    }

    #[test]
    fn field_line_rejects_method_lines() {
        assert!(parse_field_line("public void foo();").is_none());
    }

    #[test]
    fn synthetic_construct_detection() {
        assert!(is_synthetic_construct("access$100"));
        assert!(is_synthetic_construct("class$java$lang$String"));
        assert!(is_synthetic_construct("this$0"));
        assert!(is_synthetic_construct("val$captured"));
        assert!(!is_synthetic_construct("access"));
        assert!(!is_synthetic_construct("getName"));
    }
}
