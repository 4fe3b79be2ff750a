//! Declaration model builder.
//!
//! Walks the declaration tree, resolves the override rules of every element
//! and applies them on top of inferred defaults. Building runs in two
//! passes: types first, so parameters can see each struct's resolved
//! native-layout choice, then every declaration.
//!
//! Configuration problems never abort the build. An override that does not
//! apply to its target is dropped, the element is built from defaults, and a
//! [`Diagnostic`] is recorded.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, warn};

use bindmap_rules::{
    GeneratorConfig, MappingName, Overlay, ParamAttribute, RuleId, RuleStore, PATH_SEPARATOR,
};

use crate::ctype::CType;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::direction::Direction;
use crate::marshal::{map_primitive, MappedType};
use crate::model::{
    DeclKind, Declaration, DeclarationModel, EnumDecl, EnumItem, Field, FunctionDecl,
    InterfaceDecl, Parameter, StructDecl, TypeCategory, TypeRef,
};
use crate::naming::{managed_name, resolve_name};
use crate::tree::{pointer_depth, DeclTree, NodeKind, SourceLocation, TreeNode};

/// Enum size when the tree does not say.
const DEFAULT_ENUM_SIZE: u32 = 4;

/// Settings for one build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Native pointer width in bits.
    pub word_bits: u8,
    /// Namespace used when the tree does not carry one.
    pub namespace: Option<String>,
    /// Report rules whose selector matched nothing.
    pub warn_unused_rules: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            word_bits: 64,
            namespace: None,
            warn_unused_rules: true,
        }
    }
}

impl From<&GeneratorConfig> for BuildOptions {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            word_bits: config.word_bits,
            namespace: config.namespace.clone(),
            warn_unused_rules: config.warn_unused_rules,
        }
    }
}

/// The built model and every diagnostic raised while building it.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub model: DeclarationModel,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildOutput {
    /// Diagnostics of one kind.
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

/// Build the declaration model for `tree` under the rules in `store`.
pub fn build(tree: &DeclTree, store: &RuleStore, options: &BuildOptions) -> BuildOutput {
    let namespace = tree.namespace.clone().or_else(|| options.namespace.clone());
    let mut ctx = Context {
        store,
        options,
        namespace: namespace.clone(),
        types: HashMap::new(),
    };
    ctx.register_types(tree);

    let mut declarations = Vec::new();
    let mut diagnostics = Vec::new();
    let mut hits = HashSet::new();
    let mut applied = HashSet::new();
    let mut strays = Vec::new();
    for node in &tree.nodes {
        let (decl, sink) = ctx.build_declaration(node);
        declarations.extend(decl);
        diagnostics.extend(sink.diagnostics);
        hits.extend(sink.hits);
        applied.extend(sink.applied);
        strays.extend(sink.strays);
    }

    let mut sink = Sink::default();
    let mut reported = HashSet::new();
    for stray in strays {
        let key = (stray.rule, stray.group);
        if applied.contains(&key) || !reported.insert(key) {
            continue;
        }
        let selector = store
            .get(stray.rule)
            .map(|rule| rule.selector.to_string())
            .unwrap_or_default();
        sink.configuration_error(
            &stray.path,
            stray.location.as_ref(),
            format!(
                "{} from '{selector}' do not apply to {} declarations",
                stray.group, stray.kind
            ),
        );
    }

    if options.warn_unused_rules {
        for (id, rule) in store.unused(&hits) {
            sink.push(Diagnostic::new(
                DiagnosticKind::SelectorMiss,
                rule.selector.to_string(),
                format!("{id} matched no declaration"),
            ));
        }
    }
    diagnostics.extend(sink.diagnostics);

    debug!(
        declarations = declarations.len(),
        diagnostics = diagnostics.len(),
        "built declaration model"
    );

    BuildOutput {
        model: DeclarationModel {
            namespace,
            declarations,
        },
        diagnostics,
    }
}

/// A declared type as parameters and fields see it.
#[derive(Debug, Clone)]
struct TypeEntry {
    category: TypeCategory,
    name: String,
    native_name: String,
    size: Option<u32>,
    has_native_value_type: bool,
}

impl TypeEntry {
    fn to_type_ref(&self) -> TypeRef {
        TypeRef {
            name: self.name.clone(),
            native_name: self.native_name.clone(),
            category: self.category,
            size: self.size,
            has_native_value_type: self.has_native_value_type,
        }
    }
}

/// Output of building one declaration.
#[derive(Debug, Default)]
struct Sink {
    diagnostics: Vec<Diagnostic>,
    hits: HashSet<RuleId>,
    /// Tag groups each rule applied to at least one element.
    applied: HashSet<(RuleId, TagGroup)>,
    strays: Vec<StrayTags>,
}

/// Tags of one rule that reached an element they do not apply to.
#[derive(Debug)]
struct StrayTags {
    rule: RuleId,
    group: TagGroup,
    kind: NodeKind,
    path: String,
    location: Option<SourceLocation>,
}

impl Sink {
    fn push(&mut self, diagnostic: Diagnostic) {
        warn!(kind = %diagnostic.kind, path = %diagnostic.path, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    fn configuration_error(
        &mut self,
        path: &str,
        location: Option<&SourceLocation>,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic::new(DiagnosticKind::ConfigurationError, path, message).at(location));
    }
}

/// Shared read-only state of one build.
struct Context<'a> {
    store: &'a RuleStore,
    options: &'a BuildOptions,
    namespace: Option<String>,
    types: HashMap<String, TypeEntry>,
}

impl Context<'_> {
    fn top_path(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => child_path(ns, name),
            None => name.to_string(),
        }
    }

    /// Resolve the overlay of `path`, dropping fields that do not apply to
    /// `kind`.
    ///
    /// Dropped tags are only recorded here. A rule is reported once the
    /// whole tree is built, and only if its tags applied nowhere.
    fn overlay(
        &self,
        path: &str,
        kind: NodeKind,
        location: Option<&SourceLocation>,
        sink: &mut Sink,
    ) -> Overlay {
        let resolution = self.store.resolve(path);
        for &id in &resolution.matched {
            sink.hits.insert(id);
            let Some(rule) = self.store.get(id) else {
                continue;
            };
            for group in TagGroup::present_in(&rule.overlay) {
                if group.applies_to(kind) {
                    sink.applied.insert((id, group));
                } else {
                    debug!(%path, rule = %id, %group, %kind, "ignoring inapplicable tags");
                    sink.strays.push(StrayTags {
                        rule: id,
                        group,
                        kind,
                        path: path.to_string(),
                        location: location.cloned(),
                    });
                }
            }
        }

        let mut overlay = resolution.overlay;
        drop_inapplicable(kind, &mut overlay);
        overlay
    }

    /// First pass: register enums, structs and interfaces.
    fn register_types(&mut self, tree: &DeclTree) {
        for node in &tree.nodes {
            let category = match node.kind {
                NodeKind::Enum => TypeCategory::Enum,
                NodeKind::Struct => TypeCategory::Struct,
                NodeKind::Interface => TypeCategory::Interface,
                _ => continue,
            };
            let path = self.top_path(&node.name);
            let overlay = self.store.resolve(&path).overlay;
            let keep_underscore = overlay.keep_underscore.unwrap_or(false);
            let entry = TypeEntry {
                category,
                name: resolve_name(&node.name, overlay.name.as_ref(), keep_underscore),
                native_name: node.name.clone(),
                size: match category {
                    TypeCategory::Enum => Some(node.size.unwrap_or(DEFAULT_ENUM_SIZE)),
                    TypeCategory::Struct => node.size,
                    _ => None,
                },
                has_native_value_type: category == TypeCategory::Struct
                    && overlay.requests_native_layout(),
            };
            debug!(%path, name = %entry.name, ?category, "registered type");
            self.types
                .entry(entry.name.clone())
                .or_insert_with(|| entry.clone());
            self.types.insert(node.name.clone(), entry);
        }
    }

    /// Second pass: build one top-level declaration.
    fn build_declaration(&self, node: &TreeNode) -> (Option<Declaration>, Sink) {
        let mut sink = Sink::default();
        let path = self.top_path(&node.name);
        let decl = match node.kind {
            NodeKind::Enum => Some(self.build_enum(node, path, &mut sink)),
            NodeKind::Struct => Some(self.build_struct(node, path, &mut sink)),
            NodeKind::Interface => Some(self.build_interface(node, path, &mut sink)),
            NodeKind::Function => Some(self.build_function(node, path, &mut sink)),
            kind => {
                debug!(%path, %kind, "skipping node");
                None
            }
        };
        (decl, sink)
    }

    fn build_enum(&self, node: &TreeNode, path: String, sink: &mut Sink) -> Declaration {
        let location = node.location.as_ref();
        let overlay = self.overlay(&path, NodeKind::Enum, location, sink);
        let keep_underscore = overlay.keep_underscore.unwrap_or(false);

        let prefix = format!("{}_", node.name);
        let mut items: Vec<EnumItem> = node
            .children_of(NodeKind::Item)
            .map(|item| {
                let item_path = child_path(&path, &item.name);
                let item_overlay =
                    self.overlay(&item_path, NodeKind::Item, item.location.as_ref(), sink);
                let short = item.name.strip_prefix(&prefix).unwrap_or(&item.name);
                EnumItem {
                    native_name: item.name.clone(),
                    name: resolve_name(
                        short,
                        item_overlay.name.as_ref(),
                        item_overlay.keep_underscore.unwrap_or(keep_underscore),
                    ),
                    value: item.value.clone(),
                }
            })
            .collect();

        let has_none = overlay.none.unwrap_or(false);
        if has_none && !items.iter().any(|item| item.name == "None") {
            items.insert(
                0,
                EnumItem {
                    native_name: String::new(),
                    name: "None".to_string(),
                    value: Some("0".to_string()),
                },
            );
        }

        Declaration {
            name: resolve_name(&node.name, overlay.name.as_ref(), keep_underscore),
            native_name: node.name.clone(),
            visibility: overlay.visibility.unwrap_or_default(),
            location: node.location.clone(),
            kind: DeclKind::Enum(EnumDecl {
                items,
                size: node.size.unwrap_or(DEFAULT_ENUM_SIZE),
                is_flags: overlay.flags.unwrap_or(false),
                has_none,
            }),
            path,
        }
    }

    fn build_struct(&self, node: &TreeNode, path: String, sink: &mut Sink) -> Declaration {
        let location = node.location.as_ref();
        let overlay = self.overlay(&path, NodeKind::Struct, location, sink);
        let keep_underscore = overlay.keep_underscore.unwrap_or(false);

        let fields = node
            .children_of(NodeKind::Field)
            .map(|field| self.build_field(field, &path, sink))
            .collect();

        Declaration {
            name: resolve_name(&node.name, overlay.name.as_ref(), keep_underscore),
            native_name: node.name.clone(),
            visibility: overlay.visibility.unwrap_or_default(),
            location: node.location.clone(),
            kind: DeclKind::Struct(StructDecl {
                fields,
                size: node.size,
                has_native_value_type: overlay.requests_native_layout(),
                is_class: overlay.struct_to_class.unwrap_or(false),
                has_custom_marshal: overlay.custom_marshal.unwrap_or(false),
                has_custom_new: overlay.custom_new.unwrap_or(false),
                force_marshal_to: overlay.force_marshal_to.unwrap_or(false),
            }),
            path,
        }
    }

    fn build_field(&self, node: &TreeNode, parent: &str, sink: &mut Sink) -> Field {
        let path = child_path(parent, &node.name);
        let location = node.location.as_ref();
        let overlay = self.overlay(&path, NodeKind::Field, location, sink);

        let depth = match &overlay.pointer {
            Some(pointer) => pointer_depth(Some(pointer)),
            None => node.pointer_depth(),
        };
        let type_name = node.type_name.as_deref().unwrap_or("void");
        let mut mapped = self.resolve_type(type_name, depth, &path, location, sink);
        let mut is_bool_to_int = false;
        if let Some(target) = &overlay.mapping_type {
            match self.override_type(target, &mapped.type_ref) {
                Some((type_ref, bool_to_int)) => {
                    mapped.type_ref = type_ref;
                    is_bool_to_int = bool_to_int;
                }
                None => sink.configuration_error(
                    &path,
                    location,
                    format!("unknown type '{target}' in 'type' override"),
                ),
            }
        }

        Field {
            name: match &overlay.name {
                Some(MappingName { value, is_final: true }) => value.clone(),
                Some(MappingName { value, .. }) => managed_name(value, false),
                None => managed_name(&node.name, overlay.keep_underscore.unwrap_or(false)),
            },
            native_name: node.name.clone(),
            visibility: overlay.visibility.unwrap_or_default(),
            type_ref: mapped.type_ref,
            pointer_depth: mapped.ref_depth,
            array_dimension: overlay.array.or(node.array).filter(|n| *n > 0),
            is_bool_to_int,
            path,
        }
    }

    fn build_interface(&self, node: &TreeNode, path: String, sink: &mut Sink) -> Declaration {
        let location = node.location.as_ref();
        let overlay = self.overlay(&path, NodeKind::Interface, location, sink);
        let keep_underscore = overlay.keep_underscore.unwrap_or(false);

        let methods = node
            .children_of(NodeKind::Function)
            .map(|method| self.build_function(method, child_path(&path, &method.name), sink))
            .collect();

        let is_dual_callback = overlay.callback_dual.unwrap_or(false);
        Declaration {
            name: resolve_name(&node.name, overlay.name.as_ref(), keep_underscore),
            native_name: node.name.clone(),
            visibility: overlay.visibility.unwrap_or_default(),
            location: node.location.clone(),
            kind: DeclKind::Interface(InterfaceDecl {
                base: node
                    .base
                    .as_ref()
                    .map(|base| match self.types.get(base) {
                        Some(entry) => entry.name.clone(),
                        None => base.clone(),
                    }),
                methods,
                is_callback: overlay.callback.unwrap_or(false) || is_dual_callback,
                is_dual_callback,
                callback_name: overlay.callback_name.clone(),
                callback_visibility: overlay.callback_visibility,
            }),
            path,
        }
    }

    fn build_function(&self, node: &TreeNode, path: String, sink: &mut Sink) -> Declaration {
        let location = node.location.as_ref();
        let overlay = self.overlay(&path, NodeKind::Function, location, sink);
        let keep_underscore = overlay.keep_underscore.unwrap_or(false);

        let return_type = match node.type_name.as_deref() {
            None => None,
            Some(type_name) => {
                let mapped =
                    self.resolve_type(type_name, node.pointer_depth(), &path, location, sink);
                let is_void = mapped.type_ref.category == TypeCategory::Primitive
                    && mapped.type_ref.name == "void";
                (!is_void).then_some(mapped.type_ref)
            }
        };

        let parameters = node
            .children_of(NodeKind::Parameter)
            .enumerate()
            .map(|(index, param)| self.build_parameter(param, index, &path, sink))
            .collect();

        Declaration {
            name: resolve_name(&node.name, overlay.name.as_ref(), keep_underscore),
            native_name: node.name.clone(),
            visibility: overlay.visibility.unwrap_or_default(),
            location: node.location.clone(),
            kind: DeclKind::Function(FunctionDecl {
                return_type,
                parameters,
                check_return: overlay.check.unwrap_or(true),
                allow_property: overlay.property.unwrap_or(true),
                dll: overlay.dll.clone(),
                macro_dll: overlay.macro_dll.clone(),
                group: overlay.group.clone(),
            }),
            path,
        }
    }

    fn build_parameter(
        &self,
        node: &TreeNode,
        index: usize,
        parent: &str,
        sink: &mut Sink,
    ) -> Parameter {
        let native_name = if node.name.is_empty() {
            format!("arg{index}")
        } else {
            node.name.clone()
        };
        let path = child_path(parent, &native_name);
        let location = node.location.as_ref();
        let overlay = self.overlay(&path, NodeKind::Parameter, location, sink);

        let depth = match &overlay.pointer {
            Some(pointer) => pointer_depth(Some(pointer)),
            None => node.pointer_depth(),
        };
        let type_name = node.type_name.as_deref().unwrap_or("void");
        let (type_is_const, _, _) = split_type_name(type_name);
        let is_const = node.is_const || type_is_const;
        let mut mapped = self.resolve_type(type_name, depth, &path, location, sink);

        let mut is_bool_to_int = false;
        if let Some(target) = &overlay.mapping_type {
            match self.override_type(target, &mapped.type_ref) {
                Some((type_ref, bool_to_int)) => {
                    mapped.type_ref = type_ref;
                    is_bool_to_int = bool_to_int;
                }
                None => sink.configuration_error(
                    &path,
                    location,
                    format!("unknown type '{target}' in 'type' override"),
                ),
            }
        }

        let mut attribute = overlay
            .attribute
            .or(node.attribute)
            .unwrap_or_default();
        let directional = ParamAttribute::OUT | ParamAttribute::INOUT;
        if attribute.contains(directional) {
            sink.configuration_error(&path, location, "OUT and INOUT are mutually exclusive");
            attribute.remove(directional);
        } else if attribute.intersects(directional) && mapped.ref_depth == 0 {
            sink.configuration_error(
                &path,
                location,
                "OUT/INOUT requires a pointer-typed parameter",
            );
            attribute.remove(directional);
        }

        let direction = Direction::infer(attribute, mapped.ref_depth, is_const);

        let mut used_as_return = overlay.used_as_return.unwrap_or(false);
        if used_as_return && direction != Direction::Out {
            sink.configuration_error(
                &path,
                location,
                "'return' only applies to output parameters",
            );
            used_as_return = false;
        }

        let array_dimension = overlay.array.or(node.array).filter(|n| *n > 0);
        let name = match &overlay.name {
            Some(name) => name.value.clone(),
            None => native_name.clone(),
        };

        Parameter {
            path,
            native_name,
            name,
            direction,
            type_ref: mapped.type_ref,
            is_array: attribute.contains(ParamAttribute::BUFFER) || array_dimension.is_some(),
            array_dimension,
            is_optional: attribute.contains(ParamAttribute::OPTIONAL),
            is_bool_to_int,
            used_as_return,
            pointer_depth: mapped.ref_depth,
            is_const,
        }
    }

    /// Resolve a type name reached through `depth` declared pointer levels.
    ///
    /// `const` and trailing `*` in the name itself are honored. Unknown
    /// names become opaque handles.
    fn resolve_type(
        &self,
        type_name: &str,
        depth: u8,
        path: &str,
        location: Option<&SourceLocation>,
        sink: &mut Sink,
    ) -> MappedType {
        let (_, base, stars) = split_type_name(type_name);
        let depth = depth.saturating_add(stars);

        if let Some(ct) = CType::parse(base) {
            return map_primitive(&ct, depth, self.options.word_bits);
        }

        if let Some(entry) = self.types.get(base) {
            let ref_depth = if entry.category == TypeCategory::Interface {
                depth.saturating_sub(1)
            } else {
                depth
            };
            return MappedType {
                type_ref: entry.to_type_ref(),
                ref_depth,
            };
        }

        sink.push(
            Diagnostic::new(
                DiagnosticKind::UnresolvedType,
                path,
                format!("unknown type '{base}', treated as an opaque handle"),
            )
            .at(location),
        );
        MappedType {
            type_ref: TypeRef::handle(self.options.word_bits).with_native_name(base),
            ref_depth: depth,
        }
    }

    /// Apply a `type` override. Returns the new type and whether the value
    /// is a `bool` carried as a 32-bit integer.
    fn override_type(&self, target: &str, current: &TypeRef) -> Option<(TypeRef, bool)> {
        if target == "bool" && current.category == TypeCategory::Primitive {
            let is_int32 = CType::parse(&current.native_name)
                .map(|ct| ct.is_int32())
                .unwrap_or(false);
            if is_int32 {
                let type_ref = TypeRef {
                    name: "bool".to_string(),
                    ..current.clone()
                };
                return Some((type_ref, true));
            }
        }

        if let Some(entry) = self.types.get(target) {
            return Some((entry.to_type_ref(), false));
        }

        let ct = CType::parse(target)?;
        let mapped = map_primitive(&ct, 0, self.options.word_bits);
        Some((mapped.type_ref, false))
    }
}

/// Join a child name onto a parent path.
fn child_path(parent: &str, name: &str) -> String {
    format!("{parent}{PATH_SEPARATOR}{name}")
}

/// Split `const FOO **` into (is_const, "FOO", 2).
fn split_type_name(type_name: &str) -> (bool, &str, u8) {
    let mut rest = type_name.trim();
    let mut stars = 0u8;
    while let Some(stripped) = rest.strip_suffix('*') {
        stars = stars.saturating_add(1);
        rest = stripped.trim_end();
    }
    match rest.strip_prefix("const ") {
        Some(base) => (true, base.trim(), stars),
        None => (false, rest, stars),
    }
}

/// A group of overlay fields that only makes sense on one kind of element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TagGroup {
    Callback,
    Struct,
    Enum,
    Function,
    Member,
    Parameter,
}

impl TagGroup {
    const ALL: [TagGroup; 6] = [
        TagGroup::Callback,
        TagGroup::Struct,
        TagGroup::Enum,
        TagGroup::Function,
        TagGroup::Member,
        TagGroup::Parameter,
    ];

    fn present_in(overlay: &Overlay) -> impl Iterator<Item = TagGroup> + '_ {
        Self::ALL.into_iter().filter(move |group| group.is_set(overlay))
    }

    fn is_set(self, overlay: &Overlay) -> bool {
        match self {
            TagGroup::Callback => overlay.has_callback_tags(),
            TagGroup::Struct => overlay.has_struct_tags(),
            TagGroup::Enum => overlay.has_enum_tags(),
            TagGroup::Function => overlay.has_function_tags(),
            TagGroup::Member => overlay.has_member_tags(),
            TagGroup::Parameter => overlay.has_parameter_tags(),
        }
    }

    fn applies_to(self, kind: NodeKind) -> bool {
        match self {
            TagGroup::Callback => kind == NodeKind::Interface,
            TagGroup::Struct => kind == NodeKind::Struct,
            TagGroup::Enum => kind == NodeKind::Enum,
            TagGroup::Function => kind == NodeKind::Function,
            TagGroup::Member => matches!(kind, NodeKind::Parameter | NodeKind::Field),
            TagGroup::Parameter => kind == NodeKind::Parameter,
        }
    }

    fn clear(self, overlay: &mut Overlay) {
        match self {
            TagGroup::Callback => {
                overlay.callback = None;
                overlay.callback_dual = None;
                overlay.callback_name = None;
                overlay.callback_visibility = None;
            }
            TagGroup::Struct => {
                overlay.native = None;
                overlay.struct_to_class = None;
                overlay.custom_marshal = None;
                overlay.custom_new = None;
                overlay.force_marshal_to = None;
            }
            TagGroup::Enum => {
                overlay.flags = None;
                overlay.none = None;
            }
            TagGroup::Function => {
                overlay.property = None;
                overlay.check = None;
                overlay.dll = None;
                overlay.macro_dll = None;
                overlay.group = None;
            }
            TagGroup::Member => {
                overlay.mapping_type = None;
                overlay.pointer = None;
                overlay.array = None;
            }
            TagGroup::Parameter => {
                overlay.attribute = None;
                overlay.used_as_return = None;
            }
        }
    }
}

impl fmt::Display for TagGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TagGroup::Callback => "callback tags",
            TagGroup::Struct => "struct tags",
            TagGroup::Enum => "enum tags",
            TagGroup::Function => "function tags",
            TagGroup::Member => "'type', 'pointer' and 'array'",
            TagGroup::Parameter => "'attribute' and 'return'",
        })
    }
}

/// Clear every overlay field that does not apply to `kind`.
fn drop_inapplicable(kind: NodeKind, overlay: &mut Overlay) {
    for group in TagGroup::ALL {
        if !group.applies_to(kind) {
            group.clear(overlay);
        }
    }
}
