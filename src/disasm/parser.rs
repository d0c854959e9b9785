//! The line-oriented disassembly parser: walks the
//! textual output of a class-file disassembler one line at a time,
//! tracking the finite states in [`super::state::ParserState`], and
//! populates a version's [`SymbolTable`] and [`UsageTables`] as it goes.

use std::collections::{BTreeSet, HashMap};

use crate::{
    disasm::{
        lines::{is_synthetic_construct, parse_field_line, parse_method_line, parse_type_line},
        state::{access_from_modifiers, FieldBuilder, MethodBuilder, ParamBuilder, ParserState, PendingMember, TypeBuilder},
    },
    model::{
        resolve::ensure_resolved_type,
        symbol::{Access, ConstantValue, Field, Method, Parameter, Type},
        version::package_of,
        SymbolTable, TypeId, TypeKind,
    },
    usage::UsageTables,
};

/// Options governing how much the parser extracts. Mirrors the relevant
/// subset of [`crate::config::Options`] without creating a dependency
/// from this module on the ambient configuration layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Skip parameter-name extraction.
    pub quick: bool,
    /// Record which methods read or write which fields.
    pub check_implementation: bool,
}

/// The disassembly parser hit a state it cannot recover from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternalParseError {
    /// A method header line was not followed by its descriptor line.
    #[error("method `{0}` ended without a descriptor line")]
    MissingDescriptor(String),
}

/// Parses `text` (the disassembly of one or more class files, all
/// belonging to `archive`) into `table` and `usage`.
///
/// # Errors
/// See [`InternalParseError`].
pub fn parse_into(
    text: &str,
    archive: &str,
    table: &mut SymbolTable,
    usage: &mut UsageTables,
    options: ParseOptions,
) -> Result<(), InternalParseError> {
    let mut parser = Parser::new(archive.to_owned(), options);
    for line in text.lines() {
        parser.step(line, table, usage)?;
    }
    parser.finish(table);
    Ok(())
}

fn descriptor_for_source_name(name: &str) -> String {
    if let Some(base) = name.strip_suffix("[]") {
        format!("[{}", descriptor_for_source_name(base))
    } else {
        match name {
            "void" => "V".to_owned(),
            "boolean" => "Z".to_owned(),
            "char" => "C".to_owned(),
            "byte" => "B".to_owned(),
            "short" => "S".to_owned(),
            "int" => "I".to_owned(),
            "long" => "J".to_owned(),
            "float" => "F".to_owned(),
            "double" => "D".to_owned(),
            other => format!("L{};", other.replace('.', "/")),
        }
    }
}

fn method_descriptor_text(return_type: Option<&str>, params: &[ParamBuilder]) -> String {
    let params_part: String = params.iter().map(|p| descriptor_for_source_name(&p.type_name)).collect();
    let return_part = return_type.map_or_else(|| "V".to_owned(), descriptor_for_source_name);
    format!("({params_part}){return_part}")
}

fn slashes_to_dots(binary_name: &str) -> String {
    binary_name.replace('/', ".")
}

/// Splits a `//Method owner.name:descriptor` (or `//InterfaceMethod` /
/// `//Field`) comment's payload into `(owner, name, descriptor)`.
fn split_member_ref(payload: &str) -> Option<(&str, &str, &str)> {
    let (owner_and_name, descriptor) = payload.rsplit_once(':')?;
    let (owner, name) = owner_and_name.rsplit_once('.')?;
    Some((owner, name, descriptor))
}

fn annotation_name_from_descriptor(descriptor: &str) -> Option<String> {
    let inner = descriptor.strip_prefix('L')?.strip_suffix(';')?;
    Some(slashes_to_dots(inner))
}

fn extract_comment<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.find(marker).map(|idx| line[idx + marker.len()..].trim())
}

fn try_capture_pool_entry(line: &str) -> Option<(u32, String)> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix('#')?;
    let (num, rest) = rest.split_once('=')?;
    let num: u32 = num.trim().parse().ok()?;
    let rest = rest.trim();
    let value = rest.strip_prefix("Utf8")?.trim();
    Some((num, value.to_owned()))
}

/// Whichever builder is currently accumulating annotations: the
/// in-progress member, or (if none) the enclosing type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnnotationTarget {
    Member,
    Type,
}

struct Parser {
    archive: String,
    options: ParseOptions,
    state: ParserState,
    current_type: Option<TypeBuilder>,
    current_type_id: Option<TypeId>,
    current_member: Option<PendingMember>,
    annotation_target: AnnotationTarget,
    param_table_seen_header: bool,
    pool_strings: HashMap<u32, String>,
}

impl Parser {
    fn new(archive: String, options: ParseOptions) -> Self {
        Self {
            archive,
            options,
            state: ParserState::Top,
            current_type: None,
            current_type_id: None,
            current_member: None,
            annotation_target: AnnotationTarget::Type,
            param_table_seen_header: false,
            pool_strings: HashMap::new(),
        }
    }

    fn step(&mut self, raw_line: &str, table: &mut SymbolTable, usage: &mut UsageTables) -> Result<(), InternalParseError> {
        if let Some((index, value)) = try_capture_pool_entry(raw_line) {
            self.pool_strings.insert(index, value);
            return Ok(());
        }
        match self.state {
            ParserState::Top => self.step_top(raw_line),
            ParserState::InType => self.step_in_type(raw_line, table)?,
            ParserState::AwaitingDescriptor => self.step_awaiting_descriptor(raw_line)?,
            ParserState::InParamTable => self.step_param_table(raw_line),
            ParserState::InCode => self.step_code(raw_line, usage),
            ParserState::InAnnotations => self.step_annotations(raw_line),
        }
        Ok(())
    }

    fn step_top(&mut self, line: &str) {
        let Some(parsed) = parse_type_line(line) else {
            return;
        };
        let access = access_from_modifiers(&parsed.modifiers);
        self.current_type = Some(TypeBuilder {
            name: slashes_to_dots(&parsed.name),
            kind: if parsed.is_interface { TypeKind::Interface } else { TypeKind::Class },
            access,
            is_abstract: parsed.modifiers.contains(&"abstract"),
            is_final: parsed.modifiers.contains(&"final"),
            is_static: parsed.modifiers.contains(&"static"),
            is_deprecated: false,
            super_class: parsed.super_class.map(|s| slashes_to_dots(&s)),
            interfaces: parsed.interfaces.iter().map(|s| slashes_to_dots(s)).collect(),
            fields: Vec::new(),
            annotations: BTreeSet::new(),
        });
        self.current_type_id = None;
        self.state = ParserState::InType;
        self.annotation_target = AnnotationTarget::Type;
    }

    fn step_in_type(&mut self, line: &str, table: &mut SymbolTable) -> Result<(), InternalParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if self.current_member.is_some() {
                self.flush_member(table);
            }
            return Ok(());
        }
        if trimmed == "}" {
            if self.current_member.is_some() {
                self.flush_member(table);
            }
            self.flush_type(table);
            self.state = ParserState::Top;
            return Ok(());
        }
        if trimmed == "Code:" && matches!(self.current_member, Some(PendingMember::Method(_))) {
            self.state = ParserState::InCode;
            return Ok(());
        }
        if trimmed == "Deprecated: true" {
            match &mut self.current_member {
                Some(PendingMember::Method(m)) => m.is_deprecated = true,
                Some(PendingMember::Field(_)) | None => {
                    if self.current_member.is_none() {
                        if let Some(t) = &mut self.current_type {
                            t.is_deprecated = true;
                        }
                    }
                }
            }
            return Ok(());
        }
        if trimmed.starts_with("RuntimeVisibleAnnotations:") || trimmed.starts_with("RuntimeInvisibleAnnotations:") {
            self.annotation_target = if self.current_member.is_some() { AnnotationTarget::Member } else { AnnotationTarget::Type };
            self.state = ParserState::InAnnotations;
            return Ok(());
        }
        if self.current_member.is_none() && trimmed.starts_with("Signature:") {
            // The raw bytecode-level generic-signature attribute (JVM
            // descriptor encoding, e.g. `<T:Ljava/lang/Object;>...`).
            // The declared type parameters themselves were already
            // stripped to their bare names off the human-readable class
            // header by `lines::parse_type_line`; this attribute carries
            // no further information worth keeping.
            return Ok(());
        }
        if let Some(PendingMember::Field(f)) = &mut self.current_member {
            if let Some(value) = trimmed.strip_prefix("Constant value:") {
                let value = value.trim();
                let (type_tok, literal) = value.split_once(' ').unwrap_or((value, ""));
                let literal = if type_tok == "String" {
                    literal.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(literal)
                } else {
                    literal
                };
                f.value = Some(literal.to_owned());
                return Ok(());
            }
            if trimmed.starts_with("Signature:") {
                return Ok(());
            }
        }
        let class_simple_name = self
            .current_type
            .as_ref()
            .map(|t| t.name.rsplit(['.', '$']).next().unwrap_or(&t.name).to_owned())
            .unwrap_or_default();
        if let Some(parsed) = parse_method_line(line, &class_simple_name) {
            if is_synthetic_construct(&parsed.name) {
                return Ok(());
            }
            if self.current_member.is_some() {
                self.flush_member(table);
            }
            let access = access_from_modifiers(&parsed.modifiers);
            let params = parsed.params.iter().map(|p| ParamBuilder { type_name: p.clone(), name: None }).collect();
            self.current_member = Some(PendingMember::Method(MethodBuilder {
                short_name: parsed.name,
                access,
                is_abstract: parsed.modifiers.contains(&"abstract"),
                is_final: parsed.modifiers.contains(&"final"),
                is_static: parsed.modifiers.contains(&"static"),
                is_native: parsed.modifiers.contains(&"native"),
                is_synchronized: parsed.modifiers.contains(&"synchronized"),
                is_constructor: parsed.is_constructor,
                is_deprecated: false,
                return_type: parsed.return_type,
                params,
                throws: parsed.throws,
                descriptor: None,
                annotations: BTreeSet::new(),
            }));
            self.state = ParserState::AwaitingDescriptor;
            self.annotation_target = AnnotationTarget::Member;
            return Ok(());
        }
        if let Some(parsed) = parse_field_line(line) {
            if is_synthetic_construct(&parsed.name) {
                return Ok(());
            }
            if self.current_member.is_some() {
                self.flush_member(table);
            }
            let access = access_from_modifiers(&parsed.modifiers);
            let position = self.current_type.as_ref().map_or(0, |t| t.fields.len());
            self.current_member = Some(PendingMember::Field(FieldBuilder {
                name: parsed.name,
                field_type: parsed.field_type,
                access,
                is_final: parsed.modifiers.contains(&"final"),
                is_static: parsed.modifiers.contains(&"static"),
                is_transient: parsed.modifiers.contains(&"transient"),
                is_volatile: parsed.modifiers.contains(&"volatile"),
                position,
                value: None,
            }));
            self.annotation_target = AnnotationTarget::Member;
        }
        Ok(())
    }

    fn step_awaiting_descriptor(&mut self, line: &str) -> Result<(), InternalParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        let Some(PendingMember::Method(m)) = &mut self.current_member else {
            self.state = ParserState::InType;
            return Ok(());
        };
        if let Some(descriptor) = trimmed.strip_prefix("descriptor:") {
            m.descriptor = Some(descriptor.trim().to_owned());
            self.state = ParserState::InType;
            return Ok(());
        }
        if trimmed.starts_with("Signature:") {
            m.descriptor = Some(method_descriptor_text(m.return_type.as_deref(), &m.params));
            self.state = ParserState::InType;
            return Ok(());
        }
        Err(InternalParseError::MissingDescriptor(m.short_name.clone()))
    }

    fn step_param_table(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            self.param_table_seen_header = false;
            self.state = ParserState::InType;
            return;
        }
        if !self.param_table_seen_header {
            self.param_table_seen_header = true;
            return;
        }
        if self.options.quick {
            return;
        }
        let columns: Vec<&str> = trimmed.split_whitespace().collect();
        let [_start, _length, slot, name, ..] = columns.as_slice() else {
            return;
        };
        let Ok(slot) = slot.parse::<usize>() else {
            return;
        };
        let Some(PendingMember::Method(m)) = &mut self.current_member else {
            return;
        };
        let param_index = if m.is_static { Some(slot) } else { slot.checked_sub(1) };
        let Some(param_index) = param_index else {
            return;
        };
        if let Some(param) = m.params.get_mut(param_index) {
            if param.name.is_none() {
                param.name = Some((*name).to_owned());
            }
        }
    }

    fn step_code(&mut self, line: &str, usage: &mut UsageTables) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            self.state = ParserState::InType;
            return;
        }
        if trimmed.starts_with("LocalVariableTable:") {
            self.param_table_seen_header = false;
            self.state = ParserState::InParamTable;
            return;
        }
        let Some(caller) = self.caller_id() else {
            return;
        };
        if let Some(payload) = extract_comment(trimmed, "//InterfaceMethod ").or_else(|| extract_comment(trimmed, "//Method ")) {
            self.record_invocation(&caller, payload, usage);
        } else if self.options.check_implementation {
            if let Some(payload) = extract_comment(trimmed, "//Field ") {
                if let Some((owner, name, descriptor)) = split_member_ref(payload) {
                    usage.record_field_use(&caller, &slashes_to_dots(owner), name, descriptor);
                }
            }
        }
    }

    fn record_invocation(&self, caller: &str, payload: &str, usage: &mut UsageTables) {
        let Some((owner, name, descriptor)) = split_member_ref(payload) else {
            return;
        };
        let owner = slashes_to_dots(owner);
        let resolved_on_declaring_class = self.current_type.as_ref().is_some_and(|t| t.name == owner);
        usage.record_invocation(caller, &owner, name, descriptor, resolved_on_declaring_class);
    }

    fn caller_id(&self) -> Option<String> {
        let owner = self.current_type.as_ref()?.name.clone();
        let PendingMember::Method(m) = self.current_member.as_ref()? else {
            return None;
        };
        let descriptor = m.descriptor.clone().unwrap_or_default();
        Some(format!("{owner}.\"{}\":{descriptor}", m.short_name))
    }

    fn step_annotations(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            self.state = ParserState::InType;
            return;
        }
        let Some(hash_pos) = trimmed.find('#') else {
            return;
        };
        let rest = &trimmed[hash_pos + 1..];
        let index_text: String = rest.chars().take_while(char::is_ascii_digit).collect();
        let Ok(index) = index_text.parse::<u32>() else {
            return;
        };
        let Some(descriptor) = self.pool_strings.get(&index) else {
            return;
        };
        let Some(name) = annotation_name_from_descriptor(descriptor) else {
            return;
        };
        match self.annotation_target {
            AnnotationTarget::Type => {
                if let Some(t) = &mut self.current_type {
                    t.annotations.insert(name);
                }
            }
            AnnotationTarget::Member => {
                if let Some(PendingMember::Method(m)) = &mut self.current_member {
                    m.annotations.insert(name);
                }
            }
        }
    }

    /// Ensures `current_type_id` names the placeholder for the type
    /// currently being accumulated, so in-progress methods can reference
    /// a stable [`TypeId`] before the type itself is fully defined.
    fn type_id(&mut self, table: &mut SymbolTable) -> Option<TypeId> {
        if self.current_type_id.is_none() {
            let name = self.current_type.as_ref()?.name.clone();
            self.current_type_id = Some(table.ensure_type(&name));
        }
        self.current_type_id
    }

    fn flush_member(&mut self, table: &mut SymbolTable) {
        let Some(member) = self.current_member.take() else {
            return;
        };
        let Some(type_id) = self.type_id(table) else {
            return;
        };
        match member {
            PendingMember::Method(m) => {
                let return_type = m.return_type.as_deref().map(|t| ensure_resolved_type(table, t));
                let parameters = m
                    .params
                    .iter()
                    .map(|p| Parameter { param_type: ensure_resolved_type(table, &p.type_name), name: p.name.clone() })
                    .collect();
                let exceptions = m.throws.iter().map(|e| ensure_resolved_type(table, e)).collect();
                let annotations = m.annotations.iter().map(|a| ensure_resolved_type(table, a)).collect();
                let descriptor_text = m.descriptor.clone().unwrap_or_else(|| method_descriptor_text(m.return_type.as_deref(), &m.params));
                table.add_method(Method {
                    short_name: m.short_name,
                    descriptor: descriptor_text.parse().unwrap_or_else(|_| "()V".parse().expect("fallback descriptor is well-formed")),
                    class: type_id,
                    return_type,
                    parameters,
                    exceptions,
                    access: m.access,
                    is_abstract: m.is_abstract,
                    is_final: m.is_final,
                    is_static: m.is_static,
                    is_native: m.is_native,
                    is_synchronized: m.is_synchronized,
                    is_constructor: m.is_constructor,
                    is_deprecated: m.is_deprecated,
                    annotations,
                    archive: Some(self.archive.clone()),
                });
            }
            PendingMember::Field(f) => {
                let field_type = ensure_resolved_type(table, &f.field_type);
                let value = f.value.as_deref().map(ConstantValue::from_literal);
                let field = Field {
                    name: f.name,
                    field_type,
                    access: f.access,
                    is_final: f.is_final,
                    is_static: f.is_static,
                    is_transient: f.is_transient,
                    is_volatile: f.is_volatile,
                    position: f.position,
                    value,
                    mangled: descriptor_for_source_name(&f.field_type),
                };
                if let Some(t) = &mut self.current_type {
                    t.fields.push(field);
                }
            }
        }
    }

    fn flush_type(&mut self, table: &mut SymbolTable) {
        let Some(builder) = self.current_type.take() else {
            return;
        };
        self.current_type_id = None;
        let super_class = builder.super_class.as_deref().map(|s| ensure_resolved_type(table, s));
        let super_interfaces = builder.interfaces.iter().map(|i| ensure_resolved_type(table, i)).collect();
        let annotations = builder.annotations.iter().map(|a| ensure_resolved_type(table, a)).collect();
        let package = package_of(&builder.name);
        table.define_type(Type {
            name: builder.name,
            kind: builder.kind,
            package,
            archive: Some(self.archive.clone()),
            access: builder.access,
            is_abstract: builder.is_abstract,
            is_final: builder.is_final,
            is_static: builder.is_static,
            is_annotation: false,
            is_deprecated: builder.is_deprecated,
            super_class,
            super_interfaces,
            fields: builder.fields,
            annotations,
            base_type: None,
        });
    }

    fn finish(&mut self, table: &mut SymbolTable) {
        if self.current_member.is_some() {
            self.flush_member(table);
        }
        if self.current_type.is_some() {
            self.flush_type(table);
        }
    }
}
