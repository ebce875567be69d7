use crate::ast::FunctionDef;
use crate::types::{JsValue, number_ops};
use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug)]
pub enum Completion {
    Normal(JsValue),
    Return(JsValue),
    Throw(JsValue),
    Break(Option<String>),
    Continue(Option<String>),
}

impl Completion {
    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }
}

pub type EnvRef = Rc<RefCell<Environment>>;

/// What a scope record was created for. Everything except `Block` is a var
/// scope: `var` declarations and sloppy direct eval hoist into the nearest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Block,
    /// Holds parameters, `this` and `arguments`.
    Parameters { arguments_object: bool },
    /// Body scope of a function whose parameters need their own tier.
    Function,
    Eval,
    Global,
}

impl ScopeKind {
    pub fn is_var_scope(self) -> bool {
        self != ScopeKind::Block
    }
}

#[derive(Debug)]
pub struct Environment {
    pub(crate) bindings: FxHashMap<String, Binding>,
    pub(crate) parent: Option<EnvRef>,
    pub strict: bool,
    pub kind: ScopeKind,
}

#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) value: JsValue,
    pub(crate) kind: BindingKind,
    pub(crate) initialized: bool,
}

/// How a named function expression treats writes to its own name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfNameMode {
    SilentIgnore,
    ErrorOnWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    /// `undefined`, `NaN` and `Infinity` on the global object.
    ReadOnly,
    SelfName(SelfNameMode),
}

/// Why a binding write or read did not go through. The interpreter decides
/// which error object, if any, each one becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingError {
    Unresolved,
    Uninitialized,
    ConstAssign,
    ReadOnly,
    SelfNameImmutable,
}

impl Environment {
    /// A block scope under `parent`, inheriting its strictness.
    pub fn new(parent: Option<EnvRef>) -> EnvRef {
        Self::new_scope(parent, ScopeKind::Block)
    }

    pub fn new_scope(parent: Option<EnvRef>, kind: ScopeKind) -> EnvRef {
        let strict = parent.as_ref().is_some_and(|p| p.borrow().strict);
        Rc::new(RefCell::new(Environment {
            bindings: FxHashMap::default(),
            parent,
            strict,
            kind,
        }))
    }

    /// Creates the binding in this record. `var` bindings start out as
    /// `undefined`, every other kind is uninitialized until `initialize`.
    /// A `var` declaration of a name this record already binds is a no-op.
    pub fn declare(&mut self, name: &str, kind: BindingKind) {
        if kind == BindingKind::Var && self.bindings.contains_key(name) {
            return;
        }
        self.bindings.insert(
            name.to_string(),
            Binding {
                value: JsValue::Undefined,
                kind,
                initialized: kind == BindingKind::Var,
            },
        );
    }

    /// Sets the value of a binding in this record, ignoring its kind.
    pub fn initialize(&mut self, name: &str, value: JsValue) {
        match self.bindings.get_mut(name) {
            Some(binding) => {
                binding.value = value;
                binding.initialized = true;
            }
            None => {
                self.bindings.insert(
                    name.to_string(),
                    Binding {
                        value,
                        kind: BindingKind::Var,
                        initialized: true,
                    },
                );
            }
        }
    }

    /// Ordinary assignment: writes the nearest binding named `name`.
    pub fn set(&mut self, name: &str, value: JsValue) -> Result<(), BindingError> {
        if let Some(binding) = self.bindings.get_mut(name) {
            if !binding.initialized {
                return Err(BindingError::Uninitialized);
            }
            return match binding.kind {
                BindingKind::Var | BindingKind::Let => {
                    binding.value = value;
                    Ok(())
                }
                BindingKind::Const => Err(BindingError::ConstAssign),
                BindingKind::ReadOnly => Err(BindingError::ReadOnly),
                BindingKind::SelfName(SelfNameMode::SilentIgnore) => Ok(()),
                BindingKind::SelfName(SelfNameMode::ErrorOnWrite) => {
                    Err(BindingError::SelfNameImmutable)
                }
            };
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().set(name, value),
            None => Err(BindingError::Unresolved),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<JsValue, BindingError> {
        if let Some(binding) = self.bindings.get(name) {
            if !binding.initialized {
                return Err(BindingError::Uninitialized);
            }
            return Ok(binding.value.clone());
        }
        match &self.parent {
            Some(parent) => parent.borrow().lookup(name),
            None => Err(BindingError::Unresolved),
        }
    }

    pub fn get(&self, name: &str) -> Option<JsValue> {
        self.lookup(name).ok()
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

/// Nearest enclosing scope that receives `var` declarations.
pub fn var_scope(env: &EnvRef) -> EnvRef {
    let mut current = env.clone();
    loop {
        let parent = {
            let e = current.borrow();
            if e.kind.is_var_scope() {
                return current.clone();
            }
            e.parent.clone()
        };
        match parent {
            Some(p) => current = p,
            None => return current,
        }
    }
}

pub type NativeFn = Rc<dyn Fn(&mut super::Interpreter, &JsValue, &[JsValue]) -> Completion>;

#[derive(Clone)]
pub enum JsFunction {
    User {
        def: Rc<FunctionDef>,
        closure: EnvRef,
    },
    /// Name, arity, body and whether `new` may be applied.
    Native(String, usize, NativeFn, bool),
}

impl JsFunction {
    pub fn native(
        name: String,
        arity: usize,
        f: impl Fn(&mut super::Interpreter, &JsValue, &[JsValue]) -> Completion + 'static,
    ) -> Self {
        JsFunction::Native(name, arity, Rc::new(f), false)
    }

    pub fn constructor(
        name: String,
        arity: usize,
        f: impl Fn(&mut super::Interpreter, &JsValue, &[JsValue]) -> Completion + 'static,
    ) -> Self {
        JsFunction::Native(name, arity, Rc::new(f), true)
    }

    pub fn is_constructor(&self) -> bool {
        match self {
            JsFunction::User { def, .. } => matches!(
                def.kind,
                crate::ast::FunctionKind::Declaration | crate::ast::FunctionKind::Expression
            ),
            JsFunction::Native(_, _, _, ctor) => *ctor,
        }
    }
}

impl std::fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsFunction::User { def, .. } => write!(f, "JsFunction::User({:?})", def.name),
            JsFunction::Native(name, arity, _, _) => {
                write!(f, "JsFunction::Native({name:?}, {arity})")
            }
        }
    }
}

/// A data property slot. Accessors are not part of the object model.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub value: JsValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyDescriptor {
    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value,
            writable,
            enumerable,
            configurable,
        }
    }

    pub fn data_default(value: JsValue) -> Self {
        Self::data(value, true, true, true)
    }
}

pub struct JsObjectData {
    pub id: u64,
    pub properties: FxHashMap<String, PropertyDescriptor>,
    pub property_order: Vec<String>,
    /// Lookup-only link; the arena owns every record.
    pub prototype: Option<Weak<RefCell<JsObjectData>>>,
    pub callable: Option<JsFunction>,
    /// Dense storage for arrays. `None` slots are holes.
    pub array_elements: Option<Vec<Option<JsValue>>>,
    pub class_name: String,
    pub extensible: bool,
    pub primitive_value: Option<JsValue>,
    /// Mapped `arguments`: index key to the parameter binding it aliases.
    pub parameter_map: Option<FxHashMap<String, (EnvRef, String)>>,
}

impl JsObjectData {
    pub(crate) fn new() -> Self {
        Self {
            id: 0,
            properties: FxHashMap::default(),
            property_order: Vec::new(),
            prototype: None,
            callable: None,
            array_elements: None,
            class_name: "Object".to_string(),
            extensible: true,
            primitive_value: None,
            parameter_map: None,
        }
    }

    pub fn prototype_rc(&self) -> Option<Rc<RefCell<JsObjectData>>> {
        self.prototype.as_ref().and_then(Weak::upgrade)
    }

    pub fn set_prototype(&mut self, proto: Option<&Rc<RefCell<JsObjectData>>>) {
        self.prototype = proto.map(Rc::downgrade);
    }

    fn mapped_parameter(&self, key: &str) -> Option<JsValue> {
        let (env, name) = self.parameter_map.as_ref()?.get(key)?;
        env.borrow().get(name)
    }

    fn string_data(&self) -> Option<&crate::types::JsString> {
        match &self.primitive_value {
            Some(JsValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Own slot for `key`, synthesized for array elements, `length` and
    /// the characters of a String wrapper.
    pub fn get_own_property(&self, key: &str) -> Option<PropertyDescriptor> {
        if let Some(desc) = self.properties.get(key) {
            let mut d = desc.clone();
            if let Some(v) = self.mapped_parameter(key) {
                d.value = v;
            }
            return Some(d);
        }
        if let Some(elems) = &self.array_elements {
            if key == "length" {
                return Some(PropertyDescriptor::data(
                    JsValue::Number(elems.len() as f64),
                    true,
                    false,
                    false,
                ));
            }
            if let Some(idx) = number_ops::parse_array_index(key)
                && let Some(Some(v)) = elems.get(idx as usize)
            {
                return Some(PropertyDescriptor::data_default(v.clone()));
            }
        }
        if let Some(s) = self.string_data() {
            if key == "length" {
                return Some(PropertyDescriptor::data(
                    JsValue::Number(s.len() as f64),
                    false,
                    false,
                    false,
                ));
            }
            if let Some(idx) = number_ops::parse_array_index(key)
                && (idx as usize) < s.len()
            {
                let ch = s.slice_utf16(idx as usize, idx as usize + 1);
                return Some(PropertyDescriptor::data(
                    JsValue::String(ch),
                    false,
                    true,
                    false,
                ));
            }
        }
        None
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.get_own_property(key).is_some()
    }

    pub fn get_property_descriptor(&self, key: &str) -> Option<PropertyDescriptor> {
        if let Some(d) = self.get_own_property(key) {
            return Some(d);
        }
        self.prototype_rc()?.borrow().get_property_descriptor(key)
    }

    pub fn get_property(&self, key: &str) -> JsValue {
        self.get_property_descriptor(key)
            .map(|d| d.value)
            .unwrap_or(JsValue::Undefined)
    }

    pub fn has_property(&self, key: &str) -> bool {
        if self.has_own_property(key) {
            return true;
        }
        match self.prototype_rc() {
            Some(proto) => proto.borrow().has_property(key),
            None => false,
        }
    }

    /// Own keys in enumeration order: array indices ascending, then string
    /// keys in insertion order. Non-enumerable keys are included when
    /// `include_hidden` is set.
    pub fn own_keys(&self, include_hidden: bool) -> Vec<(String, bool)> {
        let mut indices: Vec<(u32, bool)> = Vec::new();
        if let Some(elems) = &self.array_elements {
            for (i, v) in elems.iter().enumerate() {
                if v.is_some() {
                    indices.push((i as u32, true));
                }
            }
        }
        if let Some(s) = self.string_data() {
            indices.extend((0..s.len() as u32).map(|i| (i, true)));
        }
        let mut named = Vec::new();
        for k in &self.property_order {
            let Some(desc) = self.properties.get(k) else {
                continue;
            };
            if !desc.enumerable && !include_hidden {
                continue;
            }
            match number_ops::parse_array_index(k) {
                Some(i) => indices.push((i, desc.enumerable)),
                None => named.push((k.clone(), desc.enumerable)),
            }
        }
        indices.sort_by_key(|(i, _)| *i);
        indices.dedup_by_key(|(i, _)| *i);
        indices
            .into_iter()
            .map(|(i, e)| (i.to_string(), e))
            .chain(named)
            .collect()
    }

    /// Keys a for-in loop visits. Own keys come first; a key seen anywhere
    /// earlier in the chain, enumerable or not, hides later occurrences.
    pub fn enumerable_keys_with_proto(&self) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut keys = Vec::new();
        self.collect_enumerable_keys(&mut seen, &mut keys);
        keys
    }

    fn collect_enumerable_keys(&self, seen: &mut FxHashSet<String>, keys: &mut Vec<String>) {
        for (k, enumerable) in self.own_keys(true) {
            if seen.insert(k.clone()) && enumerable {
                keys.push(k);
            }
        }
        if let Some(proto) = self.prototype_rc() {
            proto.borrow().collect_enumerable_keys(seen, keys);
        }
    }

    /// Creates or replaces an own slot. Returns false when the existing slot
    /// is non-configurable or the object is not extensible.
    pub fn define_own_property(&mut self, key: String, desc: PropertyDescriptor) -> bool {
        if let Some(current) = self.properties.get(&key) {
            if !current.configurable
                && (desc.configurable
                    || desc.enumerable != current.enumerable
                    || (!current.writable && desc.writable))
            {
                return false;
            }
        } else if !self.extensible {
            return false;
        }
        if let Some(map) = self.parameter_map.as_mut()
            && let Some((env, name)) = map.get(&key).cloned()
        {
            if let Err(err) = env.borrow_mut().set(&name, desc.value.clone()) {
                trace!("mapped argument '{key}' not written through to '{name}': {err:?}");
            }
            if !desc.writable {
                map.remove(&key);
            }
        }
        if self.try_store_element(&key, &desc) {
            return true;
        }
        if !self.properties.contains_key(&key) {
            self.property_order.push(key.clone());
        }
        self.properties.insert(key, desc);
        true
    }

    fn try_store_element(&mut self, key: &str, desc: &PropertyDescriptor) -> bool {
        let plain = desc.writable && desc.enumerable && desc.configurable;
        let Some(elems) = self.array_elements.as_mut() else {
            return false;
        };
        let Some(idx) = number_ops::parse_array_index(key) else {
            return false;
        };
        let idx = idx as usize;
        if !plain {
            if let Some(slot) = elems.get_mut(idx) {
                *slot = None;
            }
            return false;
        }
        if idx >= elems.len() {
            elems.resize(idx + 1, None);
        }
        elems[idx] = Some(desc.value.clone());
        true
    }

    /// Ordinary [[Set]] on this record: updates a writable own slot or adds
    /// a new one. Returns false when the write is refused.
    pub fn set_property_value(&mut self, key: &str, value: JsValue) -> bool {
        if let Some(map) = &self.parameter_map
            && let Some((env, name)) = map.get(key)
        {
            if let Err(err) = env.borrow_mut().set(name, value.clone()) {
                trace!("mapped argument '{key}' not written through to '{name}': {err:?}");
            }
        }
        if let Some(desc) = self.properties.get_mut(key) {
            if !desc.writable {
                return false;
            }
            desc.value = value;
            return true;
        }
        if self.array_elements.is_some() {
            if key == "length" {
                return self.set_array_length(&value);
            }
            if number_ops::parse_array_index(key).is_some() {
                if !self.extensible {
                    return false;
                }
                return self.try_store_element(key, &PropertyDescriptor::data_default(value));
            }
        }
        if let Some(s) = self.string_data()
            && (key == "length"
                || number_ops::parse_array_index(key).is_some_and(|i| (i as usize) < s.len()))
        {
            return false;
        }
        if let Some(proto) = self.prototype_rc()
            && let Some(inherited) = proto.borrow().get_property_descriptor(key)
            && !inherited.writable
        {
            return false;
        }
        if !self.extensible {
            return false;
        }
        self.insert_value(key.to_string(), value);
        true
    }

    fn set_array_length(&mut self, value: &JsValue) -> bool {
        let JsValue::Number(n) = value else {
            return false;
        };
        if *n < 0.0 || n.fract() != 0.0 || *n > u32::MAX as f64 {
            return false;
        }
        if let Some(elems) = self.array_elements.as_mut() {
            elems.resize(*n as usize, None);
        }
        true
    }

    /// Removes an own slot. Returns false if it is non-configurable.
    pub fn delete_property(&mut self, key: &str) -> bool {
        if let Some(desc) = self.properties.get(key) {
            if !desc.configurable {
                return false;
            }
            self.properties.remove(key);
            self.property_order.retain(|k| k != key);
            if let Some(map) = self.parameter_map.as_mut() {
                map.remove(key);
            }
            return true;
        }
        if let Some(elems) = self.array_elements.as_mut() {
            if key == "length" {
                return false;
            }
            if let Some(idx) = number_ops::parse_array_index(key)
                && let Some(slot) = elems.get_mut(idx as usize)
            {
                *slot = None;
                return true;
            }
        }
        if let Some(s) = self.string_data()
            && (key == "length"
                || number_ops::parse_array_index(key).is_some_and(|i| (i as usize) < s.len()))
        {
            return false;
        }
        true
    }

    pub fn insert_value(&mut self, key: String, value: JsValue) {
        if !self.properties.contains_key(&key) {
            self.property_order.push(key.clone());
        }
        self.properties
            .insert(key, PropertyDescriptor::data_default(value));
    }

    /// Writable, configurable and hidden from enumeration.
    pub fn insert_builtin(&mut self, key: String, value: JsValue) {
        self.insert_property(key, PropertyDescriptor::data(value, true, false, true));
    }

    pub fn insert_property(&mut self, key: String, desc: PropertyDescriptor) {
        if !self.properties.contains_key(&key) {
            self.property_order.push(key.clone());
        }
        self.properties.insert(key, desc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj() -> Rc<RefCell<JsObjectData>> {
        Rc::new(RefCell::new(JsObjectData::new()))
    }

    #[test]
    fn const_and_tdz_writes_are_rejected() {
        let env = Environment::new_scope(None, ScopeKind::Global);
        env.borrow_mut().declare("c", BindingKind::Const);
        assert_eq!(
            env.borrow_mut().set("c", JsValue::Number(1.0)),
            Err(BindingError::Uninitialized)
        );
        env.borrow_mut().initialize("c", JsValue::Number(1.0));
        assert_eq!(
            env.borrow_mut().set("c", JsValue::Number(2.0)),
            Err(BindingError::ConstAssign)
        );
        assert_eq!(
            env.borrow_mut().set("missing", JsValue::Null),
            Err(BindingError::Unresolved)
        );
    }

    #[test]
    fn self_name_modes() {
        let env = Environment::new_scope(None, ScopeKind::Global);
        env.borrow_mut()
            .declare("f", BindingKind::SelfName(SelfNameMode::SilentIgnore));
        env.borrow_mut().initialize("f", JsValue::Number(7.0));
        assert_eq!(env.borrow_mut().set("f", JsValue::Null), Ok(()));
        assert!(matches!(env.borrow().get("f"), Some(JsValue::Number(n)) if n == 7.0));

        let strict = Environment::new(Some(env.clone()));
        strict
            .borrow_mut()
            .declare("g", BindingKind::SelfName(SelfNameMode::ErrorOnWrite));
        strict.borrow_mut().initialize("g", JsValue::Null);
        assert_eq!(
            strict.borrow_mut().set("g", JsValue::Undefined),
            Err(BindingError::SelfNameImmutable)
        );
    }

    #[test]
    fn var_scope_skips_blocks() {
        let global = Environment::new_scope(None, ScopeKind::Global);
        let params = Environment::new_scope(
            Some(global.clone()),
            ScopeKind::Parameters {
                arguments_object: true,
            },
        );
        let block = Environment::new(Some(params.clone()));
        let inner = Environment::new(Some(block));
        assert!(Rc::ptr_eq(&var_scope(&inner), &params));
        assert!(Rc::ptr_eq(&var_scope(&global), &global));
    }

    #[test]
    fn redeclaring_var_keeps_value() {
        let env = Environment::new_scope(None, ScopeKind::Function);
        env.borrow_mut().declare("x", BindingKind::Var);
        env.borrow_mut().set("x", JsValue::Number(3.0)).unwrap();
        env.borrow_mut().declare("x", BindingKind::Var);
        assert!(matches!(env.borrow().get("x"), Some(JsValue::Number(n)) if n == 3.0));
    }

    #[test]
    fn enumeration_puts_indices_first() {
        let o = obj();
        {
            let mut b = o.borrow_mut();
            b.insert_value("y".into(), JsValue::Number(2.0));
            b.insert_value("10".into(), JsValue::Number(0.0));
            b.insert_value("a".into(), JsValue::Number(0.0));
            b.insert_value("1".into(), JsValue::Number(3.0));
        }
        assert_eq!(
            o.borrow().enumerable_keys_with_proto(),
            vec!["1", "10", "y", "a"]
        );
    }

    #[test]
    fn hidden_own_key_shadows_inherited_one() {
        let proto = obj();
        proto
            .borrow_mut()
            .insert_value("x".into(), JsValue::Number(3.0));
        let o = obj();
        {
            let mut b = o.borrow_mut();
            b.insert_value("y".into(), JsValue::Number(2.0));
            b.insert_value("1".into(), JsValue::Number(3.0));
            b.define_own_property(
                "x".into(),
                PropertyDescriptor::data(JsValue::Number(1.0), false, false, false),
            );
            b.set_prototype(Some(&proto));
        }
        assert_eq!(o.borrow().enumerable_keys_with_proto(), vec!["1", "y"]);
        assert!(matches!(o.borrow().get_property("x"), JsValue::Number(n) if n == 1.0));
    }

    #[test]
    fn non_configurable_slot_survives_delete() {
        let o = obj();
        o.borrow_mut().define_own_property(
            "k".into(),
            PropertyDescriptor::data(JsValue::Null, false, false, false),
        );
        assert!(!o.borrow_mut().delete_property("k"));
        assert!(o.borrow_mut().delete_property("absent"));
        assert!(o.borrow().has_own_property("k"));
    }

    #[test]
    fn array_elements_grow_and_report_length() {
        let o = obj();
        o.borrow_mut().array_elements = Some(Vec::new());
        assert!(o.borrow_mut().set_property_value("2", JsValue::Number(1.0)));
        assert!(matches!(o.borrow().get_property("length"), JsValue::Number(n) if n == 3.0));
        assert!(!o.borrow().has_own_property("0"));
        assert_eq!(o.borrow().enumerable_keys_with_proto(), vec!["2"]);
    }

    #[test]
    fn mapped_parameter_aliases_binding() {
        let env = Environment::new_scope(
            None,
            ScopeKind::Parameters {
                arguments_object: true,
            },
        );
        env.borrow_mut().declare("a", BindingKind::Var);
        env.borrow_mut().set("a", JsValue::Number(1.0)).unwrap();
        let o = obj();
        {
            let mut b = o.borrow_mut();
            b.insert_value("0".into(), JsValue::Number(1.0));
            let mut map = FxHashMap::default();
            map.insert("0".to_string(), (env.clone(), "a".to_string()));
            b.parameter_map = Some(map);
        }
        env.borrow_mut().set("a", JsValue::Number(5.0)).unwrap();
        assert!(matches!(o.borrow().get_property("0"), JsValue::Number(n) if n == 5.0));
        o.borrow_mut().set_property_value("0", JsValue::Number(9.0));
        assert!(matches!(env.borrow().get("a"), Some(JsValue::Number(n)) if n == 9.0));
    }

    #[test]
    fn refused_alias_write_still_updates_the_slot() {
        let env = Environment::new_scope(None, ScopeKind::Global);
        let o = obj();
        {
            let mut b = o.borrow_mut();
            b.insert_value("0".into(), JsValue::Number(1.0));
            let mut map = FxHashMap::default();
            map.insert("0".to_string(), (env.clone(), "gone".to_string()));
            b.parameter_map = Some(map);
        }
        assert!(o.borrow_mut().set_property_value("0", JsValue::Number(4.0)));
        assert!(matches!(o.borrow().properties.get("0"), Some(d) if matches!(d.value, JsValue::Number(n) if n == 4.0)));
        assert!(env.borrow().get("gone").is_none());
    }
}
