use super::*;

mod array;
mod number;
mod string;

pub(crate) type ObjectRef = Rc<RefCell<JsObjectData>>;

pub(crate) fn arg(args: &[JsValue], i: usize) -> JsValue {
    args.get(i).cloned().unwrap_or(JsValue::Undefined)
}

/// The native error constructors besides `Error` itself.
const ERROR_KINDS: [&str; 4] = ["TypeError", "ReferenceError", "SyntaxError", "RangeError"];

impl Interpreter {
    /// Installs a native method as a hidden property of `target`.
    pub(crate) fn define_method(
        &mut self,
        target: &ObjectRef,
        name: &str,
        arity: usize,
        f: impl Fn(&mut Interpreter, &JsValue, &[JsValue]) -> Completion + 'static,
    ) {
        let func = self.create_function(JsFunction::native(name.to_string(), arity, f));
        target.borrow_mut().insert_builtin(name.to_string(), func);
    }

    /// Creates a native constructor bound to `proto`, links
    /// `proto.constructor` back to it and binds it as a global.
    pub(crate) fn define_constructor(
        &mut self,
        name: &str,
        arity: usize,
        proto: &ObjectRef,
        f: impl Fn(&mut Interpreter, &JsValue, &[JsValue]) -> Completion + 'static,
    ) -> Option<ObjectRef> {
        let ctor = self.create_function(JsFunction::constructor(name.to_string(), arity, f));
        let ctor_obj = self.object_of(&ctor)?;
        ctor_obj.borrow_mut().insert_property(
            "prototype".to_string(),
            PropertyDescriptor::data(Self::object_value(proto), false, false, false),
        );
        proto
            .borrow_mut()
            .insert_builtin("constructor".to_string(), ctor.clone());
        self.define_global(name, ctor);
        Some(ctor_obj)
    }

    pub(crate) fn setup_globals(&mut self) {
        let object_proto = self.create_object_with_proto(None);
        self.object_prototype = Some(object_proto.clone());

        let function_proto = self.create_object_with_proto(Some(&object_proto));
        {
            let mut f = function_proto.borrow_mut();
            f.class_name = "Function".to_string();
            f.callable = Some(JsFunction::native(String::new(), 0, |_, _, _| {
                Completion::Normal(JsValue::Undefined)
            }));
        }
        self.function_prototype = Some(function_proto.clone());

        let array_proto = self.create_object_with_proto(Some(&object_proto));
        array_proto.borrow_mut().array_elements = Some(Vec::new());
        array_proto.borrow_mut().class_name = "Array".to_string();
        self.array_prototype = Some(array_proto.clone());

        let mut wrapper_proto = |class: &str, prim: JsValue| {
            let proto = self.create_object_with_proto(Some(&object_proto));
            {
                let mut p = proto.borrow_mut();
                p.class_name = class.to_string();
                p.primitive_value = Some(prim);
            }
            proto
        };
        let string_proto = wrapper_proto("String", JsValue::str(""));
        let number_proto = wrapper_proto("Number", JsValue::Number(0.0));
        let boolean_proto = wrapper_proto("Boolean", JsValue::Boolean(false));
        self.string_prototype = Some(string_proto.clone());
        self.number_prototype = Some(number_proto.clone());
        self.boolean_prototype = Some(boolean_proto.clone());

        let global_obj = self.create_object();
        global_obj.borrow_mut().class_name = "global".to_string();
        let global_val = Self::object_value(&global_obj);
        {
            let mut env = self.global_env.borrow_mut();
            env.declare("this", BindingKind::Const);
            env.initialize("this", global_val.clone());
        }
        self.define_global("globalThis", global_val.clone());
        self.global_object = Some(global_val);

        self.setup_global_functions();
        self.setup_object(&object_proto);
        self.setup_function(&function_proto);
        self.setup_array(&array_proto);
        self.setup_string(&string_proto);
        self.setup_number(&number_proto);
        self.setup_boolean(&boolean_proto);
        self.setup_errors(&object_proto);
    }

    fn setup_global_functions(&mut self) {
        let eval_fn = self.create_function(JsFunction::native("eval".to_string(), 1, |interp, _this, args| {
            interp.indirect_eval(args.first())
        }));
        self.eval_function = Some(eval_fn.clone());
        self.define_global("eval", eval_fn);

        self.register_global_fn("isNaN", 1, |interp, _this, args| {
            let n = try_result!(interp.to_number_value(&arg(args, 0)));
            Completion::Normal(JsValue::Boolean(n.is_nan()))
        });
        self.register_global_fn("parseInt", 2, |interp, _this, args| {
            let s = try_result!(interp.to_string_value(&arg(args, 0)));
            let radix = try_result!(interp.to_number_value(&arg(args, 1)));
            Completion::Normal(JsValue::Number(number::parse_int(&s, radix)))
        });
        self.register_global_fn("parseFloat", 1, |interp, _this, args| {
            let s = try_result!(interp.to_string_value(&arg(args, 0)));
            Completion::Normal(JsValue::Number(number::parse_float(&s)))
        });
    }

    fn setup_object(&mut self, proto: &ObjectRef) {
        let Some(ctor) = self.define_constructor("Object", 1, proto, |interp, _this, args| {
            interp.new_target.take();
            match arg(args, 0) {
                v if v.is_nullish() => Completion::Normal(Self::object_value(&interp.create_object())),
                v => Completion::Normal(try_result!(interp.to_object(&v))),
            }
        }) else {
            return;
        };

        self.define_method(&ctor, "getPrototypeOf", 1, |interp, _this, args| {
            let o = try_result!(interp.to_object(&arg(args, 0)));
            let proto = interp.object_of(&o).and_then(|o| o.borrow().prototype_rc());
            Completion::Normal(proto.map_or(JsValue::Null, |p| Self::object_value(&p)))
        });
        self.define_method(&ctor, "setPrototypeOf", 2, |interp, _this, args| {
            let target = arg(args, 0);
            let proto = arg(args, 1);
            if target.is_nullish() {
                return interp.throw_type_error("Object.setPrototypeOf called on null or undefined");
            }
            if !proto.is_object() && !proto.is_null() {
                return interp.throw_type_error("Object prototype may only be an Object or null");
            }
            let Some(obj) = interp.object_of(&target) else {
                return Completion::Normal(target);
            };
            let new_proto = interp.object_of(&proto);
            let mut cursor = new_proto.clone();
            while let Some(p) = cursor {
                if Rc::ptr_eq(&p, &obj) {
                    return interp.throw_type_error("Cyclic __proto__ value");
                }
                cursor = p.borrow().prototype_rc();
            }
            obj.borrow_mut().set_prototype(new_proto.as_ref());
            Completion::Normal(target)
        });
        self.define_method(&ctor, "create", 2, |interp, _this, args| {
            let proto = arg(args, 0);
            if !proto.is_object() && !proto.is_null() {
                return interp.throw_type_error("Object prototype may only be an Object or null");
            }
            let proto = interp.object_of(&proto);
            let obj = interp.create_object_with_proto(proto.as_ref());
            Completion::Normal(Self::object_value(&obj))
        });
        self.define_method(&ctor, "defineProperty", 3, |interp, _this, args| {
            let target = arg(args, 0);
            let Some(obj) = interp.object_of(&target) else {
                return interp.throw_type_error("Object.defineProperty called on non-object");
            };
            let key = try_result!(interp.to_property_key(&arg(args, 1)));
            let attrs = arg(args, 2);
            if !attrs.is_object() {
                return interp.throw_type_error("Property description must be an object");
            }
            let current = obj.borrow().get_own_property(&key);
            let mut desc = current.unwrap_or(PropertyDescriptor::data(
                JsValue::Undefined,
                false,
                false,
                false,
            ));
            if let Some(attrs_obj) = interp.object_of(&attrs) {
                let a = attrs_obj.borrow();
                if a.has_property("value") {
                    desc.value = a.get_property("value");
                }
                for (field, slot) in [
                    ("writable", &mut desc.writable),
                    ("enumerable", &mut desc.enumerable),
                    ("configurable", &mut desc.configurable),
                ] {
                    if a.has_property(field) {
                        *slot = to_boolean(&a.get_property(field));
                    }
                }
            }
            if !obj.borrow_mut().define_own_property(key.clone(), desc) {
                return interp.throw_type_error(&format!("Cannot redefine property: {key}"));
            }
            Completion::Normal(target)
        });
        self.define_method(&ctor, "keys", 1, |interp, _this, args| {
            let o = try_result!(interp.to_object(&arg(args, 0)));
            let keys = interp
                .object_of(&o)
                .map(|o| o.borrow().own_keys(false))
                .unwrap_or_default();
            let values = keys.into_iter().map(|(k, _)| JsValue::str(&k)).collect();
            Completion::Normal(interp.create_array(values))
        });

        self.define_method(proto, "hasOwnProperty", 1, |interp, this, args| {
            let key = try_result!(interp.to_property_key(&arg(args, 0)));
            let o = try_result!(interp.to_object(this));
            let has = interp
                .object_of(&o)
                .is_some_and(|o| o.borrow().has_own_property(&key));
            Completion::Normal(JsValue::Boolean(has))
        });
        self.define_method(proto, "toString", 0, |interp, this, _args| {
            let tag = match this {
                JsValue::Undefined => "Undefined".to_string(),
                JsValue::Null => "Null".to_string(),
                _ => {
                    let o = try_result!(interp.to_object(this));
                    interp
                        .object_of(&o)
                        .map_or("Object".to_string(), |o| o.borrow().class_name.clone())
                }
            };
            Completion::Normal(JsValue::str(&format!("[object {tag}]")))
        });
        self.define_method(proto, "valueOf", 0, |interp, this, _args| {
            Completion::Normal(try_result!(interp.to_object(this)))
        });
    }

    fn setup_function(&mut self, proto: &ObjectRef) {
        self.define_constructor("Function", 1, proto, |interp, _this, args| {
            interp.new_target.take();
            let mut params = Vec::new();
            let mut body = String::new();
            if let Some((last, rest)) = args.split_last() {
                for p in rest {
                    params.push(try_result!(interp.to_string_value(p)));
                }
                body = try_result!(interp.to_string_value(last));
            }
            let source = format!("(function anonymous({}\n) {{\n{body}\n}})", params.join(","));
            let parsed = Parser::new_for_eval(&source, false).and_then(|mut p| p.parse_program());
            let program = match parsed {
                Ok(p) => p,
                Err(e) => return Completion::Throw(interp.create_syntax_error(&e.message)),
            };
            match program.body.first() {
                Some(Statement::Expression(Expression::Function(def))) => {
                    let global = interp.global_env.clone();
                    Completion::Normal(interp.instantiate_function(def, &global))
                }
                _ => Completion::Throw(interp.create_syntax_error("Invalid function body")),
            }
        });

        self.define_method(proto, "call", 1, |interp, this, args| {
            if !interp.is_callable(this) {
                return interp.throw_type_error("Function.prototype.call called on non-function");
            }
            let this_arg = arg(args, 0);
            let rest = args.get(1..).unwrap_or(&[]);
            interp.call_function(this, &this_arg, rest)
        });
        self.define_method(proto, "apply", 2, |interp, this, args| {
            if !interp.is_callable(this) {
                return interp.throw_type_error("Function.prototype.apply called on non-function");
            }
            let this_arg = arg(args, 0);
            let list = arg(args, 1);
            let argv = if list.is_nullish() {
                Vec::new()
            } else if list.is_object() {
                try_result!(array::list_from_array_like(interp, &list))
            } else {
                return interp.throw_type_error("CreateListFromArrayLike called on non-object");
            };
            interp.call_function(this, &this_arg, &argv)
        });
        self.define_method(proto, "toString", 0, |interp, this, _args| {
            let Some(obj) = interp.object_of(this).filter(|o| o.borrow().callable.is_some())
            else {
                return interp
                    .throw_type_error("Function.prototype.toString requires that 'this' be a Function");
            };
            let name = to_js_string(&obj.borrow().get_property("name"));
            Completion::Normal(JsValue::str(&format!("function {name}() {{ [native code] }}")))
        });
    }

    fn setup_boolean(&mut self, proto: &ObjectRef) {
        self.define_constructor("Boolean", 1, proto, |interp, _this, args| {
            let constructing = interp.new_target.take().is_some();
            let b = JsValue::Boolean(to_boolean(&arg(args, 0)));
            if constructing {
                Completion::Normal(interp.create_wrapper(&b))
            } else {
                Completion::Normal(b)
            }
        });
        self.define_method(proto, "valueOf", 0, |interp, this, _args| {
            match this_primitive(interp, this, "Boolean") {
                Some(v) => Completion::Normal(v),
                None => interp.throw_type_error("Boolean.prototype.valueOf requires a Boolean"),
            }
        });
        self.define_method(proto, "toString", 0, |interp, this, _args| {
            match this_primitive(interp, this, "Boolean") {
                Some(v) => Completion::Normal(JsValue::str(&to_js_string(&v))),
                None => interp.throw_type_error("Boolean.prototype.toString requires a Boolean"),
            }
        });
    }

    fn setup_errors(&mut self, object_proto: &ObjectRef) {
        let error_proto = self.create_object_with_proto(Some(object_proto));
        {
            let mut ep = error_proto.borrow_mut();
            ep.insert_builtin("name".to_string(), JsValue::str("Error"));
            ep.insert_builtin("message".to_string(), JsValue::str(""));
        }
        self.error_prototype = Some(error_proto.clone());
        self.error_prototypes
            .insert("Error".to_string(), error_proto.clone());

        self.define_method(&error_proto, "toString", 0, |interp, this, _args| {
            if !this.is_object() {
                return interp
                    .throw_type_error("Error.prototype.toString requires that 'this' be an Object");
            }
            let name = match try_completion!(interp.get_member(this, "name")) {
                JsValue::Undefined => "Error".to_string(),
                v => try_result!(interp.to_string_value(&v)),
            };
            let msg = match try_completion!(interp.get_member(this, "message")) {
                JsValue::Undefined => String::new(),
                v => try_result!(interp.to_string_value(&v)),
            };
            let text = match (name.is_empty(), msg.is_empty()) {
                (_, true) => name,
                (true, false) => msg,
                (false, false) => format!("{name}: {msg}"),
            };
            Completion::Normal(JsValue::str(&text))
        });

        self.define_error_constructor("Error", &error_proto);
        // `Exception` is another name for the same constructor.
        let error_ctor = self.global_env.borrow().get("Error");
        if let Some(error_ctor) = error_ctor {
            self.define_global("Exception", error_ctor);
        }

        for kind in ERROR_KINDS {
            let proto = self.create_object_with_proto(Some(&error_proto));
            {
                let mut p = proto.borrow_mut();
                p.insert_builtin("name".to_string(), JsValue::str(kind));
                p.insert_builtin("message".to_string(), JsValue::str(""));
            }
            self.error_prototypes.insert(kind.to_string(), proto.clone());
            self.define_error_constructor(kind, &proto);
        }
    }

    fn define_error_constructor(&mut self, kind: &str, proto: &ObjectRef) {
        let kind_name = kind.to_string();
        self.define_constructor(kind, 1, proto, move |interp, _this, args| {
            interp.new_target.take();
            let msg = match arg(args, 0) {
                JsValue::Undefined => None,
                v => Some(try_result!(interp.to_string_value(&v))),
            };
            let err = interp.create_error(&kind_name, msg.as_deref().unwrap_or(""));
            if msg.is_none()
                && let Some(obj) = interp.object_of(&err)
            {
                obj.borrow_mut().delete_property("message");
            }
            Completion::Normal(err)
        });
    }
}

/// The primitive behind `this` for wrapper methods: the primitive itself or
/// the value boxed in a wrapper of class `class`.
pub(crate) fn this_primitive(interp: &Interpreter, this: &JsValue, class: &str) -> Option<JsValue> {
    let matches_class = |v: &JsValue| match class {
        "Boolean" => v.is_boolean(),
        "Number" => v.is_number(),
        "String" => v.is_string(),
        _ => false,
    };
    if matches_class(this) {
        return Some(this.clone());
    }
    let obj = interp.object_of(this)?;
    let o = obj.borrow();
    if o.class_name != class {
        return None;
    }
    o.primitive_value.clone().filter(|v| matches_class(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> JsValue {
        let mut interp = Interpreter::with_config(Config {
            harness: false,
            ..Config::default()
        });
        interp.eval_source(src).unwrap()
    }

    fn eval_str(src: &str) -> String {
        to_js_string(&eval(src))
    }

    #[test]
    fn error_hierarchy() {
        assert!(matches!(
            eval("new TypeError('x') instanceof Error"),
            JsValue::Boolean(true)
        ));
        assert_eq!(eval_str("String(new RangeError('deep'))"), "RangeError: deep");
        assert_eq!(eval_str("Error('plain').message"), "plain");
        assert!(matches!(eval("Exception === Error"), JsValue::Boolean(true)));
        assert!(matches!(
            eval("Object.prototype.hasOwnProperty.call(new Error(), 'message')"),
            JsValue::Boolean(false)
        ));
    }

    #[test]
    fn object_statics() {
        assert_eq!(
            eval_str("var o = {b: 1, a: 2}; o[0] = 3; Object.keys(o).join()"),
            "0,b,a"
        );
        assert!(matches!(
            eval("var p = {}; var o = Object.create(p); Object.getPrototypeOf(o) === p"),
            JsValue::Boolean(true)
        ));
        assert_eq!(
            eval_str(
                "var o = {}; Object.defineProperty(o, 'x', {value: 1}); o.x = 2; \
                 '' + o.x + Object.keys(o).length"
            ),
            "10"
        );
    }

    #[test]
    fn set_prototype_rejects_cycles() {
        assert_eq!(
            eval_str(
                "var a = {}, b = Object.create(a); \
                 try { Object.setPrototypeOf(a, b); 'no' } catch (e) { e.name }"
            ),
            "TypeError"
        );
    }

    #[test]
    fn object_to_string_tags() {
        assert_eq!(
            eval_str("Object.prototype.toString.call([])"),
            "[object Array]"
        );
        assert_eq!(
            eval_str("Object.prototype.toString.call(null)"),
            "[object Null]"
        );
        assert_eq!(
            eval_str("(function () { return Object.prototype.toString.call(arguments) })()"),
            "[object Arguments]"
        );
    }

    #[test]
    fn call_apply_and_function_constructor() {
        assert_eq!(
            eval_str("function f(a, b) { return this.x + a + b } f.call({x: 1}, 2, 3)"),
            "6"
        );
        assert_eq!(
            eval_str("function f(a, b) { return this.x + a + b } f.apply({x: 1}, [2, 3])"),
            "6"
        );
        assert_eq!(eval_str("new Function('a', 'b', 'return a * b')(6, 7)"), "42");
    }

    #[test]
    fn boolean_wrappers() {
        assert_eq!(eval_str("typeof new Boolean(false)"), "object");
        assert_eq!(eval_str("new Boolean(0).toString()"), "false");
        assert_eq!(eval_str("true.valueOf()"), "true");
    }
}
