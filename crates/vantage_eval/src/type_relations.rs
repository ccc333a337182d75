//! Type-Relations Registry & Finalization (spec.md §4.4).
//!
//! Uses `parking_lot::RwLock` internally exactly as spec.md §5 calls
//! for ("future-proofing"); callers must still never share an
//! `Interpreter` across threads — this is an implementation detail,
//! not an invitation to multi-thread the facade.

use std::rc::Rc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use vantage_ir::TypeInfo;

fn struct_implements(iface: &TypeInfo, candidate: &TypeInfo) -> bool {
    iface
        .methods
        .iter()
        .all(|iface_method| candidate.find_method(iface_method.name).is_some())
}

/// A qualified interface/method/implementer triple, ordered
/// lexicographically by its string form for deterministic finalization
/// replay (spec.md §5: "lexicographic order").
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct DispatchKey {
    pub interface_qname: Rc<str>,
    pub method_name: Rc<str>,
    pub implementer_qname: Rc<str>,
}

/// Records every known interface/struct `TypeInfo`, the `implements`
/// relation between them, and which `(interface, method)` pairs have
/// been called so they can be replayed against newly-discovered
/// implementers.
#[derive(Default)]
pub struct TypeRelations {
    interfaces: RwLock<FxHashMap<Rc<str>, Rc<TypeInfo>>>,
    structs: RwLock<FxHashMap<Rc<str>, Rc<TypeInfo>>>,
    implements: RwLock<FxHashMap<Rc<str>, Vec<Rc<str>>>>,
    pending_calls: RwLock<FxHashMap<Rc<str>, Vec<Rc<str>>>>,
    applied: RwLock<FxHashSet<(Rc<str>, Rc<str>, Rc<str>)>>,
}

impl TypeRelations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a struct type, computing `implements` against every
    /// known interface. Returns newly-discovered `(interface, struct)`
    /// qualified-name pairs so the evaluator can retroactively replay
    /// pending calls against this implementer.
    pub fn add_struct(&self, qname: Rc<str>, info: Rc<TypeInfo>) -> Vec<(Rc<str>, Rc<str>)> {
        self.structs.write().insert(Rc::clone(&qname), info.clone());
        let mut discovered = Vec::new();
        let interfaces: Vec<(Rc<str>, Rc<TypeInfo>)> = self
            .interfaces
            .read()
            .iter()
            .map(|(k, v)| (Rc::clone(k), Rc::clone(v)))
            .collect();
        for (iface_qname, iface_info) in interfaces {
            if struct_implements(&iface_info, &info) {
                let mut implements = self.implements.write();
                let list = implements.entry(Rc::clone(&iface_qname)).or_default();
                if !list.iter().any(|s| *s == qname) {
                    list.push(Rc::clone(&qname));
                    discovered.push((iface_qname, Rc::clone(&qname)));
                }
            }
        }
        discovered
    }

    /// Register an interface type, checking all known structs.
    pub fn add_interface(&self, qname: Rc<str>, info: Rc<TypeInfo>) -> Vec<(Rc<str>, Rc<str>)> {
        self.interfaces
            .write()
            .insert(Rc::clone(&qname), info.clone());
        let mut discovered = Vec::new();
        let structs: Vec<(Rc<str>, Rc<TypeInfo>)> = self
            .structs
            .read()
            .iter()
            .map(|(k, v)| (Rc::clone(k), Rc::clone(v)))
            .collect();
        for (struct_qname, struct_info) in structs {
            if struct_implements(&info, &struct_info) {
                let mut implements = self.implements.write();
                let list = implements.entry(Rc::clone(&qname)).or_default();
                if !list.iter().any(|s| *s == struct_qname) {
                    list.push(Rc::clone(&struct_qname));
                    discovered.push((Rc::clone(&qname), struct_qname));
                }
            }
        }
        discovered
    }

    /// Treat `concrete_qname` as an implementer of `iface_qname`
    /// regardless of scanner-derived method-set evidence (spec.md
    /// §4.6 `bindInterface`).
    pub fn bind_interface(&self, iface_qname: Rc<str>, concrete_qname: Rc<str>) -> bool {
        let mut implements = self.implements.write();
        let list = implements.entry(Rc::clone(&iface_qname)).or_default();
        if list.iter().any(|s| *s == concrete_qname) {
            false
        } else {
            list.push(concrete_qname);
            true
        }
    }

    /// Record that `method_name` was called on a value of static type
    /// `iface_qname`. Returns `true` the first time this pair is seen.
    pub fn record_call(&self, iface_qname: &Rc<str>, method_name: &Rc<str>) -> bool {
        let mut pending = self.pending_calls.write();
        let list = pending.entry(Rc::clone(iface_qname)).or_default();
        if list.iter().any(|m| m == method_name) {
            false
        } else {
            list.push(Rc::clone(method_name));
            true
        }
    }

    pub fn implementers(&self, iface_qname: &str) -> Vec<Rc<str>> {
        self.implements
            .read()
            .get(iface_qname)
            .cloned()
            .unwrap_or_default()
    }

    pub fn pending_methods(&self, iface_qname: &str) -> Vec<Rc<str>> {
        self.pending_calls
            .read()
            .get(iface_qname)
            .cloned()
            .unwrap_or_default()
    }

    /// Mark `(iface, method, implementer)` as dispatched; returns
    /// `true` if this is the first time (so the caller should actually
    /// evaluate the call), `false` if already applied.
    pub fn mark_applied(&self, iface_qname: &Rc<str>, method: &Rc<str>, implementer: &Rc<str>) -> bool {
        self.applied.write().insert((
            Rc::clone(iface_qname),
            Rc::clone(method),
            Rc::clone(implementer),
        ))
    }

    /// Every `(interface, method, implementer)` triple implied by
    /// currently-recorded pending calls and known implementers,
    /// lexicographically ordered, for the facade's `finalize()` pass
    /// (spec.md §4.4/§5).
    pub fn finalize_plan(&self) -> Vec<DispatchKey> {
        let pending = self.pending_calls.read();
        let implements = self.implements.read();
        let mut plan = Vec::new();
        for (iface_qname, methods) in pending.iter() {
            let Some(implementers) = implements.get(iface_qname) else {
                continue;
            };
            for method in methods {
                for implementer in implementers {
                    plan.push(DispatchKey {
                        interface_qname: Rc::clone(iface_qname),
                        method_name: Rc::clone(method),
                        implementer_qname: Rc::clone(implementer),
                    });
                }
            }
        }
        plan.sort_by(|a, b| {
            (&a.interface_qname, &a.method_name, &a.implementer_qname).cmp(&(
                &b.interface_qname,
                &b.method_name,
                &b.implementer_qname,
            ))
        });
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_ir::{MethodInfo, Name, NameInterner, TypeKind};

    fn iface(name: Name, method: Name) -> Rc<TypeInfo> {
        Rc::new(TypeInfo {
            name,
            import_path: Rc::from("pkg/a"),
            kind: TypeKind::Interface,
            fields: vec![],
            methods: vec![MethodInfo {
                name: method,
                pointer_receiver: false,
                params: vec![],
                results: vec![],
            }],
            underlying: None,
        })
    }

    fn strukt(name: Name, method: Name) -> Rc<TypeInfo> {
        Rc::new(TypeInfo {
            name,
            import_path: Rc::from("pkg/b"),
            kind: TypeKind::Struct,
            fields: vec![],
            methods: vec![MethodInfo {
                name: method,
                pointer_receiver: false,
                params: vec![],
                results: vec![],
            }],
            underlying: None,
        })
    }

    #[test]
    fn adding_struct_after_interface_discovers_implementer() {
        let interner = NameInterner::new();
        let greet = interner.intern("Greet");
        let g = interner.intern("G");
        let one = interner.intern("One");
        let relations = TypeRelations::new();
        relations.add_interface(Rc::from("pkg/a.G"), iface(g, greet));
        let discovered = relations.add_struct(Rc::from("pkg/b.One"), strukt(one, greet));
        assert_eq!(discovered, vec![(Rc::from("pkg/a.G"), Rc::from("pkg/b.One"))]);
        assert_eq!(relations.implementers("pkg/a.G"), vec![Rc::from("pkg/b.One")]);
    }

    #[test]
    fn finalize_plan_is_lexicographically_sorted() {
        let relations = TypeRelations::new();
        relations.bind_interface(Rc::from("iface.G"), Rc::from("pkg.Zeta"));
        relations.bind_interface(Rc::from("iface.G"), Rc::from("pkg.Alpha"));
        relations.record_call(&Rc::from("iface.G"), &Rc::from("Greet"));
        let plan = relations.finalize_plan();
        assert_eq!(plan.len(), 2);
        assert!(plan[0].implementer_qname < plan[1].implementer_qname);
    }

    #[test]
    fn mark_applied_is_idempotent() {
        let relations = TypeRelations::new();
        let iface_q = Rc::from("iface.G");
        let method = Rc::from("Greet");
        let impl_q = Rc::from("pkg.One");
        assert!(relations.mark_applied(&iface_q, &method, &impl_q));
        assert!(!relations.mark_applied(&iface_q, &method, &impl_q));
    }
}
