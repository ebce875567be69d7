use crate::ast::*;
use crate::config::Config;
use crate::error::EngineError;
use crate::parser::Parser;
use crate::types::{JsObject, JsString, JsValue, number_ops};
use log::{debug, trace, warn};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

macro_rules! try_completion {
    ($expr:expr) => {
        match $expr {
            Completion::Normal(v) => v,
            other => return other,
        }
    };
}

macro_rules! try_result {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => return Completion::Throw(e),
        }
    };
}

mod types;
pub use types::*;

mod helpers;
pub(crate) use helpers::*;
mod builtins;
mod call;
mod eval;
mod exec;
pub(crate) use exec::collect_var_names;

pub struct Interpreter {
    config: Config,
    global_env: EnvRef,
    global_object: Option<JsValue>,
    objects: Vec<Rc<RefCell<JsObjectData>>>,
    object_prototype: Option<Rc<RefCell<JsObjectData>>>,
    function_prototype: Option<Rc<RefCell<JsObjectData>>>,
    array_prototype: Option<Rc<RefCell<JsObjectData>>>,
    string_prototype: Option<Rc<RefCell<JsObjectData>>>,
    number_prototype: Option<Rc<RefCell<JsObjectData>>>,
    boolean_prototype: Option<Rc<RefCell<JsObjectData>>>,
    error_prototype: Option<Rc<RefCell<JsObjectData>>>,
    /// Prototype of each native error constructor, by constructor name.
    error_prototypes: FxHashMap<String, Rc<RefCell<JsObjectData>>>,
    /// The intrinsic `eval`; a call through the identifier `eval` that
    /// resolves to this object is a direct eval.
    eval_function: Option<JsValue>,
    /// Set while a native constructor runs under `new`.
    new_target: Option<JsValue>,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let global = Environment::new_scope(None, ScopeKind::Global);
        {
            let mut env = global.borrow_mut();
            env.strict = config.strict;
            for (name, value) in [
                ("undefined", JsValue::Undefined),
                ("NaN", JsValue::Number(f64::NAN)),
                ("Infinity", JsValue::Number(f64::INFINITY)),
            ] {
                env.declare(name, BindingKind::ReadOnly);
                env.initialize(name, value);
            }
        }

        let harness = config.harness;
        let mut interp = Self {
            config,
            global_env: global,
            global_object: None,
            objects: Vec::new(),
            object_prototype: None,
            function_prototype: None,
            array_prototype: None,
            string_prototype: None,
            number_prototype: None,
            boolean_prototype: None,
            error_prototype: None,
            error_prototypes: FxHashMap::default(),
            eval_function: None,
            new_target: None,
            call_depth: 0,
        };
        interp.setup_globals();
        if harness {
            crate::harness::install(&mut interp);
        }
        interp
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn global_env(&self) -> &EnvRef {
        &self.global_env
    }

    /// Binds a host function as a global.
    pub fn register_global_fn(
        &mut self,
        name: &str,
        arity: usize,
        f: impl Fn(&mut Interpreter, &JsValue, &[JsValue]) -> Completion + 'static,
    ) {
        let val = self.create_function(JsFunction::native(name.to_string(), arity, f));
        self.define_global(name, val);
    }

    pub(crate) fn define_global(&mut self, name: &str, value: JsValue) {
        let mut env = self.global_env.borrow_mut();
        env.declare(name, BindingKind::Var);
        env.initialize(name, value);
    }

    fn allocate_object_slot(&mut self, obj: Rc<RefCell<JsObjectData>>) -> u64 {
        let id = self.objects.len() as u64;
        obj.borrow_mut().id = id;
        self.objects.push(obj);
        id
    }

    pub(crate) fn create_object_with_proto(
        &mut self,
        proto: Option<&Rc<RefCell<JsObjectData>>>,
    ) -> Rc<RefCell<JsObjectData>> {
        let mut data = JsObjectData::new();
        data.set_prototype(proto);
        let obj = Rc::new(RefCell::new(data));
        self.allocate_object_slot(obj.clone());
        obj
    }

    pub(crate) fn create_object(&mut self) -> Rc<RefCell<JsObjectData>> {
        let proto = self.object_prototype.clone();
        self.create_object_with_proto(proto.as_ref())
    }

    pub(crate) fn object_value(obj: &Rc<RefCell<JsObjectData>>) -> JsValue {
        JsValue::Object(JsObject {
            id: obj.borrow().id,
        })
    }

    pub(crate) fn get_object(&self, id: u64) -> Option<Rc<RefCell<JsObjectData>>> {
        self.objects.get(id as usize).cloned()
    }

    pub(crate) fn object_of(&self, val: &JsValue) -> Option<Rc<RefCell<JsObjectData>>> {
        match val {
            JsValue::Object(o) => self.get_object(o.id),
            _ => None,
        }
    }

    pub(crate) fn create_array_with_holes(&mut self, elements: Vec<Option<JsValue>>) -> JsValue {
        let proto = self.array_prototype.clone();
        let obj = self.create_object_with_proto(proto.as_ref());
        {
            let mut o = obj.borrow_mut();
            o.class_name = "Array".to_string();
            o.array_elements = Some(elements);
        }
        Self::object_value(&obj)
    }

    pub(crate) fn create_array(&mut self, values: Vec<JsValue>) -> JsValue {
        self.create_array_with_holes(values.into_iter().map(Some).collect())
    }

    pub(crate) fn create_function(&mut self, func: JsFunction) -> JsValue {
        let (fn_name, fn_length) = match &func {
            JsFunction::User { def, .. } => (
                def.name.clone().unwrap_or_default(),
                def.expected_argument_count(),
            ),
            JsFunction::Native(name, arity, _, _) => (name.clone(), *arity),
        };
        let is_constructor = func.is_constructor();
        let proto = self.function_prototype.clone();
        let obj = self.create_object_with_proto(proto.as_ref());
        {
            let mut o = obj.borrow_mut();
            o.callable = Some(func);
            o.class_name = "Function".to_string();
            o.insert_property(
                "length".to_string(),
                PropertyDescriptor::data(JsValue::Number(fn_length as f64), false, false, true),
            );
            o.insert_property(
                "name".to_string(),
                PropertyDescriptor::data(JsValue::str(&fn_name), false, false, true),
            );
        }
        let func_val = Self::object_value(&obj);
        if is_constructor {
            let proto_obj = self.create_object();
            proto_obj
                .borrow_mut()
                .insert_builtin("constructor".to_string(), func_val.clone());
            obj.borrow_mut().insert_property(
                "prototype".to_string(),
                PropertyDescriptor::data(Self::object_value(&proto_obj), true, false, false),
            );
        }
        func_val
    }

    /// Gives an anonymous function the name of the binding or key it is
    /// assigned to.
    pub(crate) fn set_function_name(&mut self, func: &JsValue, name: &str) {
        if let Some(obj) = self.object_of(func) {
            obj.borrow_mut().insert_property(
                "name".to_string(),
                PropertyDescriptor::data(JsValue::str(name), false, false, true),
            );
        }
    }

    pub(crate) fn callable_of(&self, val: &JsValue) -> Option<JsFunction> {
        self.object_of(val)?.borrow().callable.clone()
    }

    pub(crate) fn is_callable(&self, val: &JsValue) -> bool {
        self.object_of(val)
            .is_some_and(|o| o.borrow().callable.is_some())
    }

    /// Builds `arguments`. With `mapped` set, index slots alias the named
    /// parameter bindings in the given environment.
    pub(crate) fn create_arguments_object(
        &mut self,
        args: &[JsValue],
        callee: &JsValue,
        mapped: Option<(&EnvRef, &[String])>,
    ) -> JsValue {
        let obj = self.create_object();
        {
            let mut o = obj.borrow_mut();
            o.class_name = "Arguments".to_string();
            o.insert_property(
                "length".to_string(),
                PropertyDescriptor::data(JsValue::Number(args.len() as f64), true, false, true),
            );
            for (i, val) in args.iter().enumerate() {
                o.insert_value(i.to_string(), val.clone());
            }
            if let Some((env, param_names)) = mapped {
                o.insert_builtin("callee".to_string(), callee.clone());
                let mut map = FxHashMap::default();
                let mut seen = Vec::new();
                // A repeated parameter name aliases only its last position.
                for (i, name) in param_names.iter().enumerate().rev() {
                    if i < args.len() && !seen.contains(name) {
                        map.insert(i.to_string(), (env.clone(), name.clone()));
                    }
                    seen.push(name.clone());
                }
                if !map.is_empty() {
                    o.parameter_map = Some(map);
                }
            }
        }
        Self::object_value(&obj)
    }

    /// A fresh error object whose prototype is the `kind` constructor's.
    pub(crate) fn create_error(&mut self, kind: &str, msg: &str) -> JsValue {
        let proto = self
            .error_prototypes
            .get(kind)
            .cloned()
            .or_else(|| self.error_prototype.clone());
        let obj = self.create_object_with_proto(proto.as_ref());
        {
            let mut o = obj.borrow_mut();
            o.class_name = "Error".to_string();
            o.insert_builtin("message".to_string(), JsValue::str(msg));
        }
        Self::object_value(&obj)
    }

    pub(crate) fn create_type_error(&mut self, msg: &str) -> JsValue {
        self.create_error("TypeError", msg)
    }

    pub(crate) fn create_reference_error(&mut self, msg: &str) -> JsValue {
        self.create_error("ReferenceError", msg)
    }

    pub(crate) fn create_syntax_error(&mut self, msg: &str) -> JsValue {
        self.create_error("SyntaxError", msg)
    }

    pub(crate) fn create_range_error(&mut self, msg: &str) -> JsValue {
        self.create_error("RangeError", msg)
    }

    pub(crate) fn throw_type_error(&mut self, msg: &str) -> Completion {
        Completion::Throw(self.create_type_error(msg))
    }

    /// Resolves an identifier for reading.
    pub(crate) fn lookup_name(&mut self, name: &str, env: &EnvRef) -> Completion {
        let result = env.borrow().lookup(name);
        match result {
            Ok(v) => Completion::Normal(v),
            Err(BindingError::Uninitialized) => Completion::Throw(
                self.create_reference_error(&format!(
                    "Cannot access '{name}' before initialization"
                )),
            ),
            Err(_) => {
                Completion::Throw(self.create_reference_error(&format!("{name} is not defined")))
            }
        }
    }

    /// PutValue on an identifier reference. The one place that decides
    /// between creating an implicit global and throwing.
    pub(crate) fn assign_to_name(&mut self, name: &str, value: JsValue, env: &EnvRef) -> Completion {
        let strict = env.borrow().strict;
        let result = env.borrow_mut().set(name, value.clone());
        match result {
            Ok(()) => Completion::Normal(value),
            Err(BindingError::Unresolved) if strict => {
                Completion::Throw(self.create_reference_error(&format!("{name} is not defined")))
            }
            Err(BindingError::Unresolved) => {
                trace!("implicit global '{name}'");
                self.global_env
                    .borrow_mut()
                    .initialize(name, value.clone());
                Completion::Normal(value)
            }
            Err(BindingError::ReadOnly) if strict => self.throw_type_error(&format!(
                "Cannot assign to read only property '{name}'"
            )),
            Err(BindingError::ReadOnly) => Completion::Normal(value),
            Err(BindingError::ConstAssign) | Err(BindingError::SelfNameImmutable) => {
                self.throw_type_error(&format!("Assignment to constant variable '{name}'"))
            }
            Err(BindingError::Uninitialized) => Completion::Throw(self.create_reference_error(
                &format!("Cannot access '{name}' before initialization"),
            )),
        }
    }

    /// Runs a parsed script in the global environment.
    pub fn run(&mut self, program: &Program) -> Completion {
        debug!("running script ({} statements)", program.body.len());
        let global = self.global_env.clone();
        let prev_strict = global.borrow().strict;
        global.borrow_mut().strict = prev_strict || program.strict;
        let result = match self.declaration_instantiation(&program.body, &global, &global) {
            Ok(()) => self.exec_statements(&program.body, &global),
            Err(e) => Completion::Throw(e),
        };
        global.borrow_mut().strict = prev_strict;
        debug!("script finished: {}", if result.is_abrupt() { "abrupt" } else { "normal" });
        result
    }

    /// Parses and runs `source`, returning the completion value.
    pub fn eval_source(&mut self, source: &str) -> Result<JsValue, EngineError> {
        let program = Parser::new_for_eval(source, self.config.strict)?.parse_program()?;
        match self.run(&program) {
            Completion::Throw(value) => {
                let rendered = self.value_to_display(&value);
                Err(EngineError::Uncaught { value, rendered })
            }
            Completion::Normal(v) | Completion::Return(v) => Ok(v),
            Completion::Break(_) | Completion::Continue(_) => Ok(JsValue::Undefined),
        }
    }

    /// Display form used by `println` and uncaught-exception reports.
    /// Never runs script code.
    pub fn value_to_display(&self, val: &JsValue) -> String {
        let Some(obj) = self.object_of(val) else {
            return format!("{val}");
        };
        let obj = obj.borrow();
        if obj.class_name == "Error" {
            let name = match obj.get_property("name") {
                JsValue::Undefined => "Error".to_string(),
                v => self.value_to_display(&v),
            };
            let message = self.value_to_display(&obj.get_property("message"));
            return if message.is_empty() {
                name
            } else {
                format!("{name}: {message}")
            };
        }
        if let Some(elems) = &obj.array_elements {
            return elems
                .iter()
                .map(|e| match e {
                    Some(v) if !v.is_nullish() => self.value_to_display(v),
                    _ => String::new(),
                })
                .collect::<Vec<_>>()
                .join(",");
        }
        if let Some(prim) = &obj.primitive_value {
            return format!("{prim}");
        }
        if obj.callable.is_some() {
            let name = self.value_to_display(&obj.get_property("name"));
            return format!("function {name}() {{ [native code] }}");
        }
        format!("[object {}]", obj.class_name)
    }

    /// Whether `val` is an instance of the global constructor `ctor_name`.
    pub fn is_instance_of_global(&self, val: &JsValue, ctor_name: &str) -> bool {
        let Some(ctor) = self.global_env.borrow().get(ctor_name) else {
            return false;
        };
        let Some(proto) = self.object_of(&ctor).map(|c| c.borrow().get_property("prototype"))
        else {
            return false;
        };
        match proto {
            JsValue::Object(p) => self.has_in_prototype_chain(val, p.id),
            _ => false,
        }
    }

    fn has_in_prototype_chain(&self, val: &JsValue, proto_id: u64) -> bool {
        let mut current = match val {
            JsValue::Object(_) => self
                .object_of(val)
                .and_then(|o| o.borrow().prototype_rc()),
            other => self.primitive_prototype(other),
        };
        while let Some(p) = current {
            if p.borrow().id == proto_id {
                return true;
            }
            let next = p.borrow().prototype_rc();
            current = next;
        }
        false
    }

    /// Prototype a primitive's wrapper object would have.
    pub(crate) fn primitive_prototype(&self, val: &JsValue) -> Option<Rc<RefCell<JsObjectData>>> {
        match val {
            JsValue::String(_) => self.string_prototype.clone(),
            JsValue::Number(_) => self.number_prototype.clone(),
            JsValue::Boolean(_) => self.boolean_prototype.clone(),
            _ => None,
        }
    }

    pub(crate) fn check_call_depth(&mut self) -> Result<(), JsValue> {
        if self.call_depth >= self.config.max_call_depth {
            warn!("call depth limit {} reached", self.config.max_call_depth);
            return Err(self.create_range_error("Maximum call stack size exceeded"));
        }
        Ok(())
    }
}
