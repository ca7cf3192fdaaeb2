//! Schema diff computation engine.
//!
//! The core entry point is [`diff_schemas`], which walks two parsed schemas
//! in lockstep and produces a [`SchemaDiff`]. Files are paired by their
//! stable node id, nodes by id within their parents (with a name-based
//! fallback that detects id changes), and members positionally with rename
//! and ordinal-change heuristics. Changes are emitted in traversal order;
//! the report module restores the output ordering afterwards.

use crate::changes::{
    Breakage, ChangeKind, EntityRef, MemberKind, MemberRef, NodeRef, SchemaChange, SchemaDiff,
    TypedRef, TypedRefKind,
};
use crate::compat::{type_compat, Compat};
use crate::error::{DiffError, Result};
use crate::node_index::NodeIndex;
use crate::report;
use crate::source_index::SourceIndex;
use crate::value_eq::values_equal;
use capdiff_model::{
    AnnotationBody, AnnotationTarget, ConstBody, EnumBody, Field, FieldKind, InterfaceBody,
    Method, Node, NodeBody, NodeId, ParsedSchema, SourceLocation, Type,
};
use std::collections::HashSet;

/// Compute the semantic diff between two parsed schemas.
///
/// Both schemas are borrowed read-only for the duration of the call; the
/// returned diff owns all of its payload data.
///
/// # Errors
///
/// Aborts on implementation errors: unknown node ids, generic methods,
/// implicit method parameters, non-null interface pointers or malformed
/// messages inside values. Recognized-but-unanalyzable constructs do not
/// abort; they surface as `unsupported` change records.
pub fn diff_schemas(old: &ParsedSchema, new: &ParsedSchema) -> Result<SchemaDiff> {
    Differ::new(old, new).run()
}

/// One side of the diff with its lookup structures.
struct Side<'a> {
    schema: &'a ParsedSchema,
    nodes: NodeIndex<'a>,
    locations: SourceIndex,
}

impl<'a> Side<'a> {
    fn new(schema: &'a ParsedSchema) -> Side<'a> {
        Side {
            schema,
            nodes: NodeIndex::build(schema),
            locations: SourceIndex::build(schema),
        }
    }
}

/// A positionally or heuristically paired member, handed to the
/// kind-specific body diff. Emissions locate on the new side, so the pair
/// carries the new parent and position.
struct MemberPair<'a, M> {
    new_parent: &'a Node,
    old_member: &'a M,
    new_member: &'a M,
    new_position: usize,
}

struct Differ<'a> {
    old: Side<'a>,
    new: Side<'a>,
    /// File the walk is currently inside; every emission is tagged with it.
    current_file: NodeId,
    changes: Vec<SchemaChange>,
}

impl<'a> Differ<'a> {
    fn new(old: &'a ParsedSchema, new: &'a ParsedSchema) -> Differ<'a> {
        Differ {
            old: Side::new(old),
            new: Side::new(new),
            current_file: NodeId::NONE,
            changes: Vec::new(),
        }
    }

    fn run(mut self) -> Result<SchemaDiff> {
        let old_schema = self.old.schema;
        let new_schema = self.new.schema;
        let old_file_ids: HashSet<NodeId> =
            old_schema.requested_files.iter().map(|f| f.id).collect();
        let new_file_ids: HashSet<NodeId> =
            new_schema.requested_files.iter().map(|f| f.id).collect();

        for file in &new_schema.requested_files {
            self.current_file = file.id;
            if old_file_ids.contains(&file.id) {
                let old_node = self.old.nodes.node(file.id)?;
                let new_node = self.new.nodes.node(file.id)?;
                self.diff_node_pair(old_node, new_node)?;
            } else {
                let node = self.new.nodes.node(file.id)?;
                let location = self.new.locations.node_range(file.id);
                let entity = EntityRef::Node(node_ref(node));
                self.emit(Breakage::None, location, ChangeKind::NodeAdded { entity });
            }
        }

        // A removed file is never a wire break: the compiler refuses to
        // produce the new schema while other files still reference it.
        for file in &old_schema.requested_files {
            if !new_file_ids.contains(&file.id) {
                self.current_file = file.id;
                let node = self.old.nodes.node(file.id)?;
                let location = self.old.locations.node_range(file.id);
                let entity = EntityRef::Node(node_ref(node));
                self.emit(Breakage::Code, location, ChangeKind::NodeRemoved { entity });
            }
        }

        Ok(report::package(self.changes, old_schema, new_schema))
    }

    fn emit(&mut self, breakage: Breakage, location: SourceLocation, kind: ChangeKind) {
        self.changes.push(SchemaChange {
            breakage,
            file_id: self.current_file,
            location,
            kind,
            source: None,
        });
    }

    /// Recover from a recognized-but-unanalyzable construct by emitting an
    /// `unsupported` record; implementation errors propagate.
    fn recover<T>(
        &mut self,
        location: SourceLocation,
        result: Result<T>,
    ) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_unsupported() => {
                self.emit(
                    Breakage::Wire,
                    location,
                    ChangeKind::Unsupported {
                        reason: e.to_string(),
                    },
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn emit_type_change(&mut self, compat: Compat, location: SourceLocation, target: TypedRef) {
        match compat {
            Compat::Same | Compat::Equivalent => {}
            Compat::Compatible => {
                self.emit(Breakage::Code, location, ChangeKind::NodeTypeChanged { target })
            }
            Compat::Incompatible => {
                self.emit(Breakage::Wire, location, ChangeKind::NodeTypeChanged { target })
            }
        }
    }

    // ------------------------------------------------------------------
    // Node pairing
    // ------------------------------------------------------------------

    fn diff_node_pair(&mut self, old_node: &'a Node, new_node: &'a Node) -> Result<()> {
        if old_node.kind() != new_node.kind() {
            // A kind change makes the two declarations unrelated; report
            // both lifecycles, but keep walking the nested subtrees, which
            // may persist under the changed parent.
            let old_location = self.old.locations.node_range(old_node.id);
            self.emit(
                Breakage::Code,
                old_location,
                ChangeKind::NodeRemoved {
                    entity: EntityRef::Node(node_ref(old_node)),
                },
            );
            let new_location = self.new.locations.node_range(new_node.id);
            self.emit(
                Breakage::None,
                new_location,
                ChangeKind::NodeAdded {
                    entity: EntityRef::Node(node_ref(new_node)),
                },
            );
            return self.diff_nested(old_node, new_node);
        }

        if old_node.short_name() != new_node.short_name() {
            let location = self.new.locations.node_range(new_node.id);
            self.emit(
                Breakage::Code,
                location,
                ChangeKind::NodeRenamed {
                    entity: EntityRef::Node(node_ref(new_node)),
                    old_name: old_node.short_name().to_string(),
                },
            );
        }

        match (&old_node.body, &new_node.body) {
            (NodeBody::Struct(a), NodeBody::Struct(b)) => {
                self.diff_fields(old_node, new_node, &a.fields, &b.fields)?
            }
            (NodeBody::Enum(a), NodeBody::Enum(b)) => {
                self.diff_enum(old_node, a, new_node, b)?
            }
            (NodeBody::Interface(a), NodeBody::Interface(b)) => {
                self.diff_interface(old_node, a, new_node, b)?
            }
            (NodeBody::Const(a), NodeBody::Const(b)) => {
                self.diff_const(old_node, a, new_node, b)?
            }
            (NodeBody::Annotation(a), NodeBody::Annotation(b)) => {
                self.diff_annotation(old_node, a, new_node, b)?
            }
            _ => {}
        }

        self.diff_nested(old_node, new_node)
    }

    /// Pair the nested declarations of two matched parents: by id first,
    /// then by short name and kind (an id change), else removed/added.
    fn diff_nested(&mut self, old_node: &'a Node, new_node: &'a Node) -> Result<()> {
        let mut consumed = vec![false; new_node.nested.len()];

        for old_entry in &old_node.nested {
            if let Some(position) = new_node
                .nested
                .iter()
                .position(|n| n.id == old_entry.id)
            {
                consumed[position] = true;
                let old_child = self.old.nodes.node(old_entry.id)?;
                let new_child = self.new.nodes.node(old_entry.id)?;
                self.diff_node_pair(old_child, new_child)?;
                continue;
            }

            let old_child = self.old.nodes.node(old_entry.id)?;
            let mut fallback = None;
            for (j, candidate) in new_node.nested.iter().enumerate() {
                if consumed[j] || candidate.name != old_entry.name {
                    continue;
                }
                let candidate_node = self.new.nodes.node(candidate.id)?;
                if candidate_node.kind() == old_child.kind() {
                    fallback = Some((j, candidate_node));
                    break;
                }
            }

            match fallback {
                Some((j, new_child)) => {
                    consumed[j] = true;
                    let location = self.new.locations.node_range(new_child.id);
                    self.emit(
                        Breakage::Wire,
                        location,
                        ChangeKind::NodeIdChanged {
                            entity: node_ref(new_child),
                            old_id: old_entry.id,
                        },
                    );
                    self.diff_node_pair(old_child, new_child)?;
                }
                None => {
                    let location = self.old.locations.node_range(old_child.id);
                    self.emit(
                        Breakage::Code,
                        location,
                        ChangeKind::NodeRemoved {
                            entity: EntityRef::Node(node_ref(old_child)),
                        },
                    );
                }
            }
        }

        for (j, entry) in new_node.nested.iter().enumerate() {
            if !consumed[j] {
                let node = self.new.nodes.node(entry.id)?;
                let location = self.new.locations.node_range(node.id);
                self.emit(
                    Breakage::None,
                    location,
                    ChangeKind::NodeAdded {
                        entity: EntityRef::Node(node_ref(node)),
                    },
                );
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Member diffing
    // ------------------------------------------------------------------

    /// The shared pairing algorithm for fields and methods.
    ///
    /// Members pair positionally within the common prefix; a name mismatch
    /// falls back to the lowest-index unconsumed member with the same name
    /// (an ordinal change), else a rename at the current ordinal.
    /// Positional pairing prevails over name-based fallback once it has
    /// succeeded.
    #[allow(clippy::too_many_arguments)]
    fn diff_members<M>(
        &mut self,
        kind: MemberKind,
        old_parent: &'a Node,
        new_parent: &'a Node,
        old_members: &'a [M],
        new_members: &'a [M],
        name_of: fn(&M) -> &str,
        ordinal_of: fn(&M, usize) -> u16,
        body: fn(&mut Self, MemberPair<'a, M>) -> Result<()>,
        on_removed: fn(&mut Self, &'a M, usize) -> Result<()>,
        on_added: fn(&mut Self, &'a M, usize) -> Result<()>,
    ) -> Result<()> {
        let common = old_members.len().min(new_members.len());
        let mut consumed = vec![false; new_members.len()];

        for i in 0..common {
            let old_name = name_of(&old_members[i]);

            if !consumed[i] && name_of(&new_members[i]) == old_name {
                consumed[i] = true;
                body(
                    self,
                    MemberPair {
                        new_parent,
                        old_member: &old_members[i],
                        new_member: &new_members[i],
                        new_position: i,
                    },
                )?;
                continue;
            }

            let candidate = new_members
                .iter()
                .enumerate()
                .find(|(j, m)| !consumed[*j] && name_of(m) == old_name)
                .map(|(j, _)| j);

            match candidate {
                Some(j) => {
                    consumed[j] = true;
                    let member = MemberRef {
                        kind,
                        id: new_parent.id,
                        name: old_name.to_string(),
                        ordinal: ordinal_of(&new_members[j], j),
                    };
                    let location = self
                        .new
                        .locations
                        .member_range(new_parent.id, j as u16);
                    self.emit(
                        Breakage::Wire,
                        location,
                        ChangeKind::MemberOrdinalChanged {
                            member,
                            old_ordinal: ordinal_of(&old_members[i], i),
                        },
                    );
                    body(
                        self,
                        MemberPair {
                            new_parent,
                            old_member: &old_members[i],
                            new_member: &new_members[j],
                            new_position: j,
                        },
                    )?;
                }
                None if !consumed[i] => {
                    consumed[i] = true;
                    let entity = EntityRef::Member(MemberRef {
                        kind,
                        id: new_parent.id,
                        name: name_of(&new_members[i]).to_string(),
                        ordinal: ordinal_of(&new_members[i], i),
                    });
                    let location = self
                        .new
                        .locations
                        .member_range(new_parent.id, i as u16);
                    self.emit(
                        Breakage::Code,
                        location,
                        ChangeKind::NodeRenamed {
                            entity,
                            old_name: old_name.to_string(),
                        },
                    );
                    body(
                        self,
                        MemberPair {
                            new_parent,
                            old_member: &old_members[i],
                            new_member: &new_members[i],
                            new_position: i,
                        },
                    )?;
                }
                None => {
                    // The positional partner was consumed by an earlier
                    // name match and no other candidate exists.
                    self.emit_member_removed(
                        kind,
                        old_parent,
                        old_name,
                        ordinal_of(&old_members[i], i),
                        i,
                    );
                    on_removed(self, &old_members[i], i)?;
                }
            }
        }

        for i in common..old_members.len() {
            self.emit_member_removed(
                kind,
                old_parent,
                name_of(&old_members[i]),
                ordinal_of(&old_members[i], i),
                i,
            );
            on_removed(self, &old_members[i], i)?;
        }

        for (j, member) in new_members.iter().enumerate() {
            if !consumed[j] {
                let entity = EntityRef::Member(MemberRef {
                    kind,
                    id: new_parent.id,
                    name: name_of(member).to_string(),
                    ordinal: ordinal_of(member, j),
                });
                let location = self
                    .new
                    .locations
                    .member_range(new_parent.id, j as u16);
                self.emit(Breakage::None, location, ChangeKind::NodeAdded { entity });
                on_added(self, member, j)?;
            }
        }
        Ok(())
    }

    /// Removed members break the wire: the vacated ordinal could be reused
    /// incompatibly.
    fn emit_member_removed(
        &mut self,
        kind: MemberKind,
        old_parent: &Node,
        name: &str,
        ordinal: u16,
        position: usize,
    ) {
        let entity = EntityRef::Member(MemberRef {
            kind,
            id: old_parent.id,
            name: name.to_string(),
            ordinal,
        });
        let location = self
            .old
            .locations
            .member_range(old_parent.id, position as u16);
        self.emit(Breakage::Wire, location, ChangeKind::NodeRemoved { entity });
    }

    // ------------------------------------------------------------------
    // Struct bodies
    // ------------------------------------------------------------------

    fn diff_fields(
        &mut self,
        old_parent: &'a Node,
        new_parent: &'a Node,
        old_fields: &'a [Field],
        new_fields: &'a [Field],
    ) -> Result<()> {
        self.diff_members(
            MemberKind::Field,
            old_parent,
            new_parent,
            old_fields,
            new_fields,
            |f: &Field| f.name.as_str(),
            |f: &Field, position| f.ordinal.resolve(position),
            Self::diff_field_body,
            |_, _, _| Ok(()),
            |_, _, _| Ok(()),
        )
    }

    fn diff_field_body(&mut self, pair: MemberPair<'a, Field>) -> Result<()> {
        let location = self
            .new
            .locations
            .member_range(pair.new_parent.id, pair.new_position as u16);
        let target = TypedRef {
            kind: TypedRefKind::Field,
            id: pair.new_parent.id,
            name: pair.new_member.name.clone(),
            ordinal: Some(pair.new_member.ordinal.resolve(pair.new_position)),
        };

        match (&pair.old_member.kind, &pair.new_member.kind) {
            (FieldKind::Slot { .. }, FieldKind::Group { .. })
            | (FieldKind::Group { .. }, FieldKind::Slot { .. }) => {
                self.emit(Breakage::Wire, location, ChangeKind::NodeTypeChanged { target });
            }
            (
                FieldKind::Slot {
                    ty: old_ty,
                    default: old_default,
                },
                FieldKind::Slot {
                    ty: new_ty,
                    default: new_default,
                },
            ) => {
                let compat =
                    self.recover(location, type_compat(old_ty, new_ty, &self.new.nodes))?;
                match compat {
                    None => {}
                    Some(Compat::Same) | Some(Compat::Equivalent) => {
                        match self.recover(location, values_equal(old_default, new_default))? {
                            None | Some(true) => {}
                            Some(false) => {
                                let field = MemberRef {
                                    kind: MemberKind::Field,
                                    id: pair.new_parent.id,
                                    name: pair.new_member.name.clone(),
                                    ordinal: pair
                                        .new_member
                                        .ordinal
                                        .resolve(pair.new_position),
                                };
                                self.emit(
                                    Breakage::Wire,
                                    location,
                                    ChangeKind::FieldDefaultValueChanged { field },
                                );
                            }
                        }
                    }
                    Some(compat) => self.emit_type_change(compat, location, target),
                }
            }
            (
                FieldKind::Group { type_id: old_group },
                FieldKind::Group { type_id: new_group },
            ) => {
                if old_group == new_group {
                    let old_node = self.old.nodes.node(*old_group)?;
                    let new_node = self.new.nodes.node(*new_group)?;
                    if let (NodeBody::Struct(a), NodeBody::Struct(b)) =
                        (&old_node.body, &new_node.body)
                    {
                        self.diff_fields(old_node, new_node, &a.fields, &b.fields)?;
                    }
                } else {
                    // Group ids derive from the field name, so a group
                    // swap reads as a wire-level type change.
                    self.emit(Breakage::Wire, location, ChangeKind::NodeTypeChanged { target });
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Enum bodies
    // ------------------------------------------------------------------

    /// Enumerants pair strictly by position: moving one is only meaning
    /// preserving when every name stays put, so a name mismatch at a
    /// position is a rename, and length changes are removals/additions.
    fn diff_enum(
        &mut self,
        old_node: &'a Node,
        a: &'a EnumBody,
        new_node: &'a Node,
        b: &'a EnumBody,
    ) -> Result<()> {
        let common = a.enumerants.len().min(b.enumerants.len());
        for i in 0..common {
            let old_name = &a.enumerants[i].name;
            let new_name = &b.enumerants[i].name;
            if old_name != new_name {
                let entity = EntityRef::Member(MemberRef {
                    kind: MemberKind::Enumerant,
                    id: new_node.id,
                    name: new_name.clone(),
                    ordinal: i as u16,
                });
                let location = self.new.locations.member_range(new_node.id, i as u16);
                self.emit(
                    Breakage::Code,
                    location,
                    ChangeKind::NodeRenamed {
                        entity,
                        old_name: old_name.clone(),
                    },
                );
            }
        }
        for i in common..a.enumerants.len() {
            self.emit_member_removed(
                MemberKind::Enumerant,
                old_node,
                &a.enumerants[i].name,
                i as u16,
                i,
            );
        }
        for i in common..b.enumerants.len() {
            let entity = EntityRef::Member(MemberRef {
                kind: MemberKind::Enumerant,
                id: new_node.id,
                name: b.enumerants[i].name.clone(),
                ordinal: i as u16,
            });
            let location = self.new.locations.member_range(new_node.id, i as u16);
            self.emit(Breakage::None, location, ChangeKind::NodeAdded { entity });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Interface bodies
    // ------------------------------------------------------------------

    fn diff_interface(
        &mut self,
        old_node: &'a Node,
        a: &'a InterfaceBody,
        new_node: &'a Node,
        b: &'a InterfaceBody,
    ) -> Result<()> {
        self.check_methods_supported(old_node, &a.methods)?;
        self.check_methods_supported(new_node, &b.methods)?;
        self.diff_members(
            MemberKind::Method,
            old_node,
            new_node,
            &a.methods,
            &b.methods,
            |m: &Method| m.name.as_str(),
            |_: &Method, position| position as u16,
            Self::diff_method_body,
            Self::method_removed,
            Self::method_added,
        )
    }

    fn check_methods_supported(&self, interface: &Node, methods: &[Method]) -> Result<()> {
        for method in methods {
            if method.implicit_parameters > 0 {
                return Err(DiffError::ImplicitMethodParameters {
                    interface: interface.id,
                    name: method.name.clone(),
                });
            }
            if method.param_brand_scopes > 0 || method.result_brand_scopes > 0 {
                return Err(DiffError::GenericMethod {
                    interface: interface.id,
                    name: method.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn diff_method_body(&mut self, pair: MemberPair<'a, Method>) -> Result<()> {
        self.diff_method_io(
            TypedRefKind::MethodInput,
            &pair,
            pair.old_member.param_type,
            pair.new_member.param_type,
        )?;
        self.diff_method_io(
            TypedRefKind::MethodOutput,
            &pair,
            pair.old_member.result_type,
            pair.new_member.result_type,
        )
    }

    /// Compare one side (parameters or results) of a paired method.
    ///
    /// Anonymous parameter/result structs are compiler-generated with fresh
    /// ids, so when both sides are synthetic the walk descends into their
    /// fields instead of comparing ids.
    fn diff_method_io(
        &mut self,
        kind: TypedRefKind,
        pair: &MemberPair<'a, Method>,
        old_id: NodeId,
        new_id: NodeId,
    ) -> Result<()> {
        let old_node = self.old.nodes.node(old_id)?;
        let new_node = self.new.nodes.node(new_id)?;

        if old_node.is_synthetic() && new_node.is_synthetic() {
            if let (NodeBody::Struct(a), NodeBody::Struct(b)) = (&old_node.body, &new_node.body)
            {
                return self.diff_fields(old_node, new_node, &a.fields, &b.fields);
            }
            return Ok(());
        }

        let old_ty = Type::Struct {
            type_id: old_id,
            brand_scope_count: 0,
        };
        let new_ty = Type::Struct {
            type_id: new_id,
            brand_scope_count: 0,
        };
        let location = self
            .new
            .locations
            .member_range(pair.new_parent.id, pair.new_position as u16);
        let target = TypedRef {
            kind,
            id: pair.new_parent.id,
            name: pair.new_member.name.clone(),
            ordinal: Some(pair.new_position as u16),
        };
        if let Some(compat) =
            self.recover(location, type_compat(&old_ty, &new_ty, &self.new.nodes))?
        {
            self.emit_type_change(compat, location, target);
        }
        Ok(())
    }

    fn method_removed(&mut self, method: &'a Method, _position: usize) -> Result<()> {
        self.cascade_method_fields(method, true)
    }

    fn method_added(&mut self, method: &'a Method, _position: usize) -> Result<()> {
        self.cascade_method_fields(method, false)
    }

    /// A method's anonymous parameter/result structs live outside any
    /// file's subtree, so their fields would otherwise vanish from the diff
    /// when the method appears or disappears. Surface them explicitly.
    fn cascade_method_fields(&mut self, method: &'a Method, removed: bool) -> Result<()> {
        for type_id in [method.param_type, method.result_type] {
            let node = if removed {
                self.old.nodes.node(type_id)?
            } else {
                self.new.nodes.node(type_id)?
            };
            if !node.is_synthetic() {
                continue;
            }
            let NodeBody::Struct(body) = &node.body else {
                continue;
            };
            for (i, field) in body.fields.iter().enumerate() {
                let member = MemberRef {
                    kind: MemberKind::Field,
                    id: node.id,
                    name: field.name.clone(),
                    ordinal: field.ordinal.resolve(i),
                };
                if removed {
                    let location = self.old.locations.member_range(node.id, i as u16);
                    self.emit(
                        Breakage::Wire,
                        location,
                        ChangeKind::NodeRemoved {
                            entity: EntityRef::Member(member),
                        },
                    );
                } else {
                    let location = self.new.locations.member_range(node.id, i as u16);
                    self.emit(
                        Breakage::None,
                        location,
                        ChangeKind::NodeAdded {
                            entity: EntityRef::Member(member),
                        },
                    );
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Const and annotation bodies
    // ------------------------------------------------------------------

    fn diff_const(
        &mut self,
        _old_node: &'a Node,
        a: &'a ConstBody,
        new_node: &'a Node,
        b: &'a ConstBody,
    ) -> Result<()> {
        let location = self.new.locations.node_range(new_node.id);
        let target = TypedRef {
            kind: TypedRefKind::Const,
            id: new_node.id,
            name: new_node.short_name().to_string(),
            ordinal: None,
        };
        match self.recover(location, type_compat(&a.ty, &b.ty, &self.new.nodes))? {
            None => {}
            Some(Compat::Same) | Some(Compat::Equivalent) => {
                match self.recover(location, values_equal(&a.value, &b.value))? {
                    None | Some(true) => {}
                    Some(false) => {
                        // Consts occupy no wire space; a new value only
                        // affects recompiled dependents.
                        let node = node_ref(new_node);
                        self.emit(
                            Breakage::Code,
                            location,
                            ChangeKind::ConstValueChanged { node },
                        );
                    }
                }
            }
            Some(compat) => self.emit_type_change(compat, location, target),
        }
        Ok(())
    }

    fn diff_annotation(
        &mut self,
        _old_node: &'a Node,
        a: &'a AnnotationBody,
        new_node: &'a Node,
        b: &'a AnnotationBody,
    ) -> Result<()> {
        let location = self.new.locations.node_range(new_node.id);
        let target = TypedRef {
            kind: TypedRefKind::Annotation,
            id: new_node.id,
            name: new_node.short_name().to_string(),
            ordinal: None,
        };
        if let Some(compat) =
            self.recover(location, type_compat(&a.ty, &b.ty, &self.new.nodes))?
        {
            self.emit_type_change(compat, location, target);
        }

        for annotation_target in AnnotationTarget::ALL {
            let before = a.targets.allows(annotation_target);
            let after = b.targets.allows(annotation_target);
            if before == after {
                continue;
            }
            let node = node_ref(new_node);
            if after {
                self.emit(
                    Breakage::None,
                    location,
                    ChangeKind::AnnotationTargetAdded {
                        node,
                        target: annotation_target,
                    },
                );
            } else {
                self.emit(
                    Breakage::Code,
                    location,
                    ChangeKind::AnnotationTargetRemoved {
                        node,
                        target: annotation_target,
                    },
                );
            }
        }
        Ok(())
    }
}

fn node_ref(node: &Node) -> NodeRef {
    NodeRef {
        kind: node.kind(),
        id: node.id,
        short_name: node.short_name().to_string(),
    }
}
