use super::*;

/// Resolved target of an assignment, update or call. The base and key are
/// evaluated once and reused for the read and the write.
pub(crate) enum Reference {
    Binding(String),
    Property(JsValue, String),
}

/// Remaining native stack below which a call moves onto a fresh segment.
const STACK_RED_ZONE: usize = 256 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum PreferredType {
    Default,
    Number,
    String,
}

fn numeric_operator(op: BinaryOp) -> Option<fn(f64, f64) -> f64> {
    Some(match op {
        BinaryOp::Sub => |a, b| a - b,
        BinaryOp::Mul => |a, b| a * b,
        BinaryOp::Div => |a, b| a / b,
        BinaryOp::Mod => number_ops::remainder,
        BinaryOp::Exp => number_ops::exponentiate,
        BinaryOp::LShift => number_ops::left_shift,
        BinaryOp::RShift => number_ops::signed_right_shift,
        BinaryOp::URShift => number_ops::unsigned_right_shift,
        BinaryOp::BitAnd => number_ops::bitwise_and,
        BinaryOp::BitOr => number_ops::bitwise_or,
        BinaryOp::BitXor => number_ops::bitwise_xor,
        _ => return None,
    })
}

/// Short source-like description of a callee for error messages.
fn describe_callee(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(name) => name.clone(),
        Expression::This => "this".to_string(),
        Expression::Member(obj, MemberKey::Dot(name)) => {
            format!("{}.{name}", describe_callee(obj))
        }
        Expression::Member(obj, MemberKey::Computed(_)) => {
            format!("{}[...]", describe_callee(obj))
        }
        _ => "expression".to_string(),
    }
}

impl Interpreter {
    pub(crate) fn eval_expr(&mut self, expr: &Expression, env: &EnvRef) -> Completion {
        match expr {
            Expression::Literal(lit) => Completion::Normal(Self::eval_literal(lit)),
            Expression::Identifier(name) => self.lookup_name(name, env),
            Expression::This => self.lookup_this(env),
            Expression::Array(elements) => self.eval_array_literal(elements, env),
            Expression::Object(props) => self.eval_object_literal(props, env),
            Expression::Function(def) => Completion::Normal(self.instantiate_function(def, env)),
            Expression::Unary(op, operand) => {
                let val = try_completion!(self.eval_expr(operand, env));
                self.eval_unary(*op, &val)
            }
            Expression::Typeof(operand) => self.eval_typeof(operand, env),
            Expression::Void(operand) => {
                try_completion!(self.eval_expr(operand, env));
                Completion::Normal(JsValue::Undefined)
            }
            Expression::Delete(operand) => self.eval_delete(operand, env),
            Expression::Binary(op, left, right) => {
                let lval = try_completion!(self.eval_expr(left, env));
                let rval = try_completion!(self.eval_expr(right, env));
                self.eval_binary(*op, &lval, &rval)
            }
            Expression::Logical(op, left, right) => self.eval_logical(*op, left, right, env),
            Expression::Update(op, prefix, target) => self.eval_update(*op, *prefix, target, env),
            Expression::Assign(op, target, value) => self.eval_assign(*op, target, value, env),
            Expression::Conditional(test, consequent, alternate) => {
                let t = try_completion!(self.eval_expr(test, env));
                if to_boolean(&t) {
                    self.eval_expr(consequent, env)
                } else {
                    self.eval_expr(alternate, env)
                }
            }
            Expression::Call(callee, args) => self.eval_call(callee, args, env),
            Expression::New(callee, args) => self.eval_new(callee, args, env),
            Expression::Member(obj, prop) => {
                let (base, key) = match self.eval_property_reference(obj, prop, env) {
                    Ok(r) => r,
                    Err(c) => return c,
                };
                self.get_member(&base, &key)
            }
            Expression::Sequence(exprs) => {
                let mut last = JsValue::Undefined;
                for e in exprs {
                    last = try_completion!(self.eval_expr(e, env));
                }
                Completion::Normal(last)
            }
        }
    }

    fn eval_literal(lit: &Literal) -> JsValue {
        match lit {
            Literal::Null => JsValue::Null,
            Literal::Boolean(b) => JsValue::Boolean(*b),
            Literal::Number(n) => JsValue::Number(*n),
            Literal::String(s) => JsValue::str(s),
        }
    }

    fn lookup_this(&mut self, env: &EnvRef) -> Completion {
        match env.borrow().lookup("this") {
            Ok(v) => Completion::Normal(v),
            Err(_) => Completion::Normal(JsValue::Undefined),
        }
    }

    pub(crate) fn instantiate_function(&mut self, def: &Rc<FunctionDef>, env: &EnvRef) -> JsValue {
        self.create_function(JsFunction::User {
            def: def.clone(),
            closure: env.clone(),
        })
    }

    /// Evaluates `expr`, naming it after `name` if it is an anonymous
    /// function definition.
    pub(crate) fn eval_named(&mut self, expr: &Expression, name: &str, env: &EnvRef) -> Completion {
        let val = try_completion!(self.eval_expr(expr, env));
        if expr.is_anonymous_function_definition() {
            self.set_function_name(&val, name);
        }
        Completion::Normal(val)
    }

    fn eval_array_literal(&mut self, elements: &[Option<Expression>], env: &EnvRef) -> Completion {
        let mut values = Vec::with_capacity(elements.len());
        for elem in elements {
            match elem {
                Some(e) => values.push(Some(try_completion!(self.eval_expr(e, env)))),
                None => values.push(None),
            }
        }
        Completion::Normal(self.create_array_with_holes(values))
    }

    fn eval_object_literal(&mut self, props: &[Property], env: &EnvRef) -> Completion {
        let obj = self.create_object();
        for prop in props {
            let key = match &prop.key {
                PropertyKey::Identifier(name) | PropertyKey::String(name) => name.clone(),
                PropertyKey::Number(n) => number_ops::to_string(*n),
                PropertyKey::Computed(expr) => {
                    let k = try_completion!(self.eval_expr(expr, env));
                    try_result!(self.to_property_key(&k))
                }
            };
            let value = try_completion!(self.eval_named(&prop.value, &key, env));
            obj.borrow_mut().insert_value(key, value);
        }
        Completion::Normal(Self::object_value(&obj))
    }

    // ---- coercions that may run script code ----

    pub(crate) fn to_primitive(
        &mut self,
        val: &JsValue,
        hint: PreferredType,
    ) -> Result<JsValue, JsValue> {
        if !val.is_object() {
            return Ok(val.clone());
        }
        let order = if hint == PreferredType::String {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };
        for method_name in order {
            let method = match self.get_member(val, method_name) {
                Completion::Normal(m) => m,
                Completion::Throw(e) => return Err(e),
                _ => JsValue::Undefined,
            };
            if self.is_callable(&method) {
                match self.call_function(&method, val, &[]) {
                    Completion::Normal(result) if !result.is_object() => return Ok(result),
                    Completion::Throw(e) => return Err(e),
                    _ => {}
                }
            }
        }
        Err(self.create_type_error("Cannot convert object to primitive value"))
    }

    pub(crate) fn to_number_value(&mut self, val: &JsValue) -> Result<f64, JsValue> {
        let prim = self.to_primitive(val, PreferredType::Number)?;
        Ok(to_number(&prim))
    }

    pub(crate) fn to_jsstring_value(&mut self, val: &JsValue) -> Result<JsString, JsValue> {
        match self.to_primitive(val, PreferredType::String)? {
            JsValue::String(s) => Ok(s),
            prim => Ok(JsString::from_str(&to_js_string(&prim))),
        }
    }

    pub(crate) fn to_string_value(&mut self, val: &JsValue) -> Result<String, JsValue> {
        Ok(self.to_jsstring_value(val)?.to_rust_string())
    }

    pub(crate) fn to_property_key(&mut self, val: &JsValue) -> Result<String, JsValue> {
        match val {
            JsValue::String(s) => Ok(s.to_rust_string()),
            JsValue::Object(_) => self.to_string_value(val),
            prim => Ok(to_js_string(prim)),
        }
    }

    /// ToObject: boxes primitives, rejects `null` and `undefined`.
    pub(crate) fn to_object(&mut self, val: &JsValue) -> Result<JsValue, JsValue> {
        match val {
            JsValue::Object(_) => Ok(val.clone()),
            JsValue::Undefined | JsValue::Null => {
                Err(self.create_type_error(&format!("Cannot convert {val} to object")))
            }
            prim => Ok(self.create_wrapper(prim)),
        }
    }

    pub(crate) fn create_wrapper(&mut self, prim: &JsValue) -> JsValue {
        let class_name = match prim {
            JsValue::String(_) => "String",
            JsValue::Number(_) => "Number",
            JsValue::Boolean(_) => "Boolean",
            _ => "Object",
        };
        let proto = self
            .primitive_prototype(prim)
            .or_else(|| self.object_prototype.clone());
        let obj = self.create_object_with_proto(proto.as_ref());
        {
            let mut o = obj.borrow_mut();
            o.class_name = class_name.to_string();
            o.primitive_value = Some(prim.clone());
        }
        Self::object_value(&obj)
    }

    // ---- property access ----

    pub(crate) fn eval_property_reference(
        &mut self,
        obj: &Expression,
        prop: &MemberKey,
        env: &EnvRef,
    ) -> Result<(JsValue, String), Completion> {
        let base = match self.eval_expr(obj, env) {
            Completion::Normal(v) => v,
            other => return Err(other),
        };
        let key = match prop {
            MemberKey::Dot(name) => name.clone(),
            MemberKey::Computed(expr) => {
                let k = match self.eval_expr(expr, env) {
                    Completion::Normal(v) => v,
                    other => return Err(other),
                };
                if base.is_nullish() {
                    return Err(self.nullish_access_error(&base, &to_js_string(&k)));
                }
                match self.to_property_key(&k) {
                    Ok(k) => k,
                    Err(e) => return Err(Completion::Throw(e)),
                }
            }
        };
        Ok((base, key))
    }

    fn nullish_access_error(&mut self, base: &JsValue, key: &str) -> Completion {
        self.throw_type_error(&format!(
            "Cannot read properties of {base} (reading '{key}')"
        ))
    }

    pub(crate) fn get_member(&mut self, base: &JsValue, key: &str) -> Completion {
        match base {
            JsValue::Undefined | JsValue::Null => self.nullish_access_error(base, key),
            JsValue::Object(o) => Completion::Normal(
                self.get_object(o.id)
                    .map_or(JsValue::Undefined, |obj| obj.borrow().get_property(key)),
            ),
            JsValue::String(s) => {
                if key == "length" {
                    return Completion::Normal(JsValue::Number(s.len() as f64));
                }
                if let Some(idx) = number_ops::parse_array_index(key)
                    && (idx as usize) < s.len()
                {
                    let ch = s.slice_utf16(idx as usize, idx as usize + 1);
                    return Completion::Normal(JsValue::String(ch));
                }
                Completion::Normal(self.primitive_member(base, key))
            }
            JsValue::Number(_) | JsValue::Boolean(_) => {
                Completion::Normal(self.primitive_member(base, key))
            }
        }
    }

    fn primitive_member(&self, base: &JsValue, key: &str) -> JsValue {
        self.primitive_prototype(base)
            .map_or(JsValue::Undefined, |p| p.borrow().get_property(key))
    }

    pub(crate) fn set_member(
        &mut self,
        base: &JsValue,
        key: &str,
        value: JsValue,
        strict: bool,
    ) -> Completion {
        match base {
            JsValue::Undefined | JsValue::Null => self.throw_type_error(&format!(
                "Cannot set properties of {base} (setting '{key}')"
            )),
            JsValue::Object(o) => {
                let stored = self
                    .get_object(o.id)
                    .is_some_and(|obj| obj.borrow_mut().set_property_value(key, value.clone()));
                if !stored && strict {
                    return self.throw_type_error(&format!(
                        "Cannot assign to read only property '{key}' of object"
                    ));
                }
                Completion::Normal(value)
            }
            _ if strict => self.throw_type_error(&format!(
                "Cannot create property '{key}' on {}",
                typeof_val(base, &self.objects)
            )),
            _ => Completion::Normal(value),
        }
    }

    fn eval_reference(&mut self, expr: &Expression, env: &EnvRef) -> Result<Reference, Completion> {
        match expr {
            Expression::Identifier(name) => Ok(Reference::Binding(name.clone())),
            Expression::Member(obj, prop) => {
                let (base, key) = self.eval_property_reference(obj, prop, env)?;
                Ok(Reference::Property(base, key))
            }
            _ => Err(Completion::Throw(
                self.create_syntax_error("Invalid left-hand side in assignment"),
            )),
        }
    }

    fn get_reference_value(&mut self, reference: &Reference, env: &EnvRef) -> Completion {
        match reference {
            Reference::Binding(name) => self.lookup_name(name, env),
            Reference::Property(base, key) => self.get_member(base, key),
        }
    }

    pub(crate) fn put_reference_value(
        &mut self,
        reference: &Reference,
        value: JsValue,
        env: &EnvRef,
    ) -> Completion {
        match reference {
            Reference::Binding(name) => self.assign_to_name(name, value, env),
            Reference::Property(base, key) => {
                let strict = env.borrow().strict;
                self.set_member(base, key, value, strict)
            }
        }
    }

    /// Writes through an assignment target expression (`for (a.x in o)`,
    /// destructuring into members).
    pub(crate) fn assign_to_target(
        &mut self,
        target: &Expression,
        value: JsValue,
        env: &EnvRef,
    ) -> Completion {
        let reference = match self.eval_reference(target, env) {
            Ok(r) => r,
            Err(c) => return c,
        };
        self.put_reference_value(&reference, value, env)
    }

    // ---- operators ----

    fn eval_unary(&mut self, op: UnaryOp, val: &JsValue) -> Completion {
        let result = match op {
            UnaryOp::Not => JsValue::Boolean(!to_boolean(val)),
            UnaryOp::Minus => {
                JsValue::Number(number_ops::unary_minus(try_result!(self.to_number_value(val))))
            }
            UnaryOp::Plus => JsValue::Number(try_result!(self.to_number_value(val))),
            UnaryOp::BitNot => {
                JsValue::Number(number_ops::bitwise_not(try_result!(self.to_number_value(val))))
            }
        };
        Completion::Normal(result)
    }

    fn eval_typeof(&mut self, operand: &Expression, env: &EnvRef) -> Completion {
        let val = if let Expression::Identifier(name) = operand {
            let result = env.borrow().lookup(name);
            match result {
                Ok(v) => v,
                Err(BindingError::Unresolved) => JsValue::Undefined,
                Err(_) => return self.lookup_name(name, env),
            }
        } else {
            try_completion!(self.eval_expr(operand, env))
        };
        Completion::Normal(JsValue::str(typeof_val(&val, &self.objects)))
    }

    fn eval_delete(&mut self, operand: &Expression, env: &EnvRef) -> Completion {
        match operand {
            Expression::Member(obj, prop) => {
                let (base, key) = match self.eval_property_reference(obj, prop, env) {
                    Ok(r) => r,
                    Err(c) => return c,
                };
                if base.is_nullish() {
                    return self.throw_type_error(&format!(
                        "Cannot convert {base} to object (deleting '{key}')"
                    ));
                }
                let target = try_result!(self.to_object(&base));
                let deleted = self
                    .object_of(&target)
                    .is_none_or(|o| o.borrow_mut().delete_property(&key));
                if !deleted && env.borrow().strict {
                    return self.throw_type_error(&format!("Cannot delete property '{key}'"));
                }
                Completion::Normal(JsValue::Boolean(deleted))
            }
            Expression::Identifier(_) => Completion::Normal(JsValue::Boolean(false)),
            other => {
                try_completion!(self.eval_expr(other, env));
                Completion::Normal(JsValue::Boolean(true))
            }
        }
    }

    pub(crate) fn eval_binary(&mut self, op: BinaryOp, left: &JsValue, right: &JsValue) -> Completion {
        if let Some(f) = numeric_operator(op) {
            let a = try_result!(self.to_number_value(left));
            let b = try_result!(self.to_number_value(right));
            return Completion::Normal(JsValue::Number(f(a, b)));
        }
        let result = match op {
            BinaryOp::Add => return self.eval_add(left, right),
            BinaryOp::Eq => try_result!(self.loose_equals(left, right)),
            BinaryOp::NotEq => !try_result!(self.loose_equals(left, right)),
            BinaryOp::StrictEq => strict_equality(left, right),
            BinaryOp::StrictNotEq => !strict_equality(left, right),
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => {
                let a = try_result!(self.to_primitive(left, PreferredType::Number));
                let b = try_result!(self.to_primitive(right, PreferredType::Number));
                match op {
                    BinaryOp::Lt => primitive_less_than(&a, &b) == Some(true),
                    BinaryOp::Gt => primitive_less_than(&b, &a) == Some(true),
                    BinaryOp::LtEq => primitive_less_than(&b, &a) == Some(false),
                    _ => primitive_less_than(&a, &b) == Some(false),
                }
            }
            BinaryOp::In => try_result!(self.has_property_op(left, right)),
            BinaryOp::Instanceof => try_result!(self.instance_of(left, right)),
            _ => return Completion::Normal(JsValue::Undefined),
        };
        Completion::Normal(JsValue::Boolean(result))
    }

    fn eval_add(&mut self, left: &JsValue, right: &JsValue) -> Completion {
        let lprim = try_result!(self.to_primitive(left, PreferredType::Default));
        let rprim = try_result!(self.to_primitive(right, PreferredType::Default));
        if lprim.is_string() || rprim.is_string() {
            let ls = try_result!(self.to_jsstring_value(&lprim));
            let rs = try_result!(self.to_jsstring_value(&rprim));
            return Completion::Normal(JsValue::String(ls.concat(&rs)));
        }
        Completion::Normal(JsValue::Number(to_number(&lprim) + to_number(&rprim)))
    }

    pub(crate) fn loose_equals(&mut self, left: &JsValue, right: &JsValue) -> Result<bool, JsValue> {
        match (left, right) {
            (JsValue::Object(a), JsValue::Object(b)) => Ok(a.id == b.id),
            (JsValue::Object(_), JsValue::Undefined | JsValue::Null)
            | (JsValue::Undefined | JsValue::Null, JsValue::Object(_)) => Ok(false),
            (JsValue::Object(_), _) => {
                let prim = self.to_primitive(left, PreferredType::Default)?;
                Ok(primitive_loose_equality(&prim, right))
            }
            (_, JsValue::Object(_)) => {
                let prim = self.to_primitive(right, PreferredType::Default)?;
                Ok(primitive_loose_equality(left, &prim))
            }
            _ => Ok(primitive_loose_equality(left, right)),
        }
    }

    fn has_property_op(&mut self, key: &JsValue, target: &JsValue) -> Result<bool, JsValue> {
        let Some(obj) = self.object_of(target) else {
            return Err(self.create_type_error(&format!(
                "Cannot use 'in' operator to search for a key in {target}"
            )));
        };
        let key = self.to_property_key(key)?;
        Ok(obj.borrow().has_property(&key))
    }

    /// `left instanceof right`. Primitives are looked up through the
    /// prototype their wrapper would have.
    pub(crate) fn instance_of(&mut self, left: &JsValue, right: &JsValue) -> Result<bool, JsValue> {
        if !self.is_callable(right) {
            return Err(self.create_type_error("Right-hand side of 'instanceof' is not callable"));
        }
        let proto = match self.object_of(right).map(|o| o.borrow().get_property("prototype")) {
            Some(JsValue::Object(p)) => p,
            _ => {
                return Err(self.create_type_error(
                    "Function has non-object prototype in instanceof check",
                ));
            }
        };
        Ok(self.has_in_prototype_chain(left, proto.id))
    }

    fn eval_logical(
        &mut self,
        op: LogicalOp,
        left: &Expression,
        right: &Expression,
        env: &EnvRef,
    ) -> Completion {
        let lval = try_completion!(self.eval_expr(left, env));
        let short_circuit = match op {
            LogicalOp::And => !to_boolean(&lval),
            LogicalOp::Or => to_boolean(&lval),
            LogicalOp::NullishCoalescing => !lval.is_nullish(),
        };
        if short_circuit {
            Completion::Normal(lval)
        } else {
            self.eval_expr(right, env)
        }
    }

    fn eval_update(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        target: &Expression,
        env: &EnvRef,
    ) -> Completion {
        let reference = match self.eval_reference(target, env) {
            Ok(r) => r,
            Err(c) => return c,
        };
        let old = try_completion!(self.get_reference_value(&reference, env));
        let old_num = try_result!(self.to_number_value(&old));
        let new_num = match op {
            UpdateOp::Increment => old_num + 1.0,
            UpdateOp::Decrement => old_num - 1.0,
        };
        try_completion!(self.put_reference_value(&reference, JsValue::Number(new_num), env));
        Completion::Normal(JsValue::Number(if prefix { new_num } else { old_num }))
    }

    fn eval_assign(
        &mut self,
        op: AssignOp,
        target: &Expression,
        value: &Expression,
        env: &EnvRef,
    ) -> Completion {
        if op == AssignOp::Assign
            && let Expression::Identifier(name) = target
        {
            let val = try_completion!(self.eval_named(value, name, env));
            return self.assign_to_name(name, val, env);
        }
        let reference = match self.eval_reference(target, env) {
            Ok(r) => r,
            Err(c) => return c,
        };
        let result = match op.binary_op() {
            None => try_completion!(self.eval_expr(value, env)),
            Some(bop) => {
                let old = try_completion!(self.get_reference_value(&reference, env));
                let rhs = try_completion!(self.eval_expr(value, env));
                try_completion!(self.eval_binary(bop, &old, &rhs))
            }
        };
        try_completion!(self.put_reference_value(&reference, result.clone(), env));
        Completion::Normal(result)
    }

    // ---- calls ----

    fn eval_arguments(&mut self, args: &[Expression], env: &EnvRef) -> Result<Vec<JsValue>, Completion> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match self.eval_expr(arg, env) {
                Completion::Normal(v) => values.push(v),
                other => return Err(other),
            }
        }
        Ok(values)
    }

    fn eval_call(&mut self, callee: &Expression, args: &[Expression], env: &EnvRef) -> Completion {
        let (func, this_val) = match callee {
            Expression::Member(obj, prop) => {
                let (base, key) = match self.eval_property_reference(obj, prop, env) {
                    Ok(r) => r,
                    Err(c) => return c,
                };
                (try_completion!(self.get_member(&base, &key)), base)
            }
            _ => (try_completion!(self.eval_expr(callee, env)), JsValue::Undefined),
        };
        let argv = match self.eval_arguments(args, env) {
            Ok(v) => v,
            Err(c) => return c,
        };
        if let Expression::Identifier(name) = callee
            && name == "eval"
            && self.is_eval_intrinsic(&func)
        {
            return self.direct_eval(argv.first(), env);
        }
        if !self.is_callable(&func) {
            return self.throw_type_error(&format!("{} is not a function", describe_callee(callee)));
        }
        self.call_function(&func, &this_val, &argv)
    }

    fn is_eval_intrinsic(&self, func: &JsValue) -> bool {
        matches!(
            (func, &self.eval_function),
            (JsValue::Object(a), Some(JsValue::Object(b))) if a.id == b.id
        )
    }

    fn eval_new(&mut self, callee: &Expression, args: &[Expression], env: &EnvRef) -> Completion {
        let ctor = try_completion!(self.eval_expr(callee, env));
        let argv = match self.eval_arguments(args, env) {
            Ok(v) => v,
            Err(c) => return c,
        };
        let constructible = self
            .callable_of(&ctor)
            .is_some_and(|f| f.is_constructor());
        if !constructible {
            return self.throw_type_error(&format!(
                "{} is not a constructor",
                describe_callee(callee)
            ));
        }
        self.construct(&ctor, &argv)
    }

    /// [[Construct]]: allocates `this` from `ctor.prototype` and keeps it
    /// unless the constructor returns an object.
    pub(crate) fn construct(&mut self, ctor: &JsValue, args: &[JsValue]) -> Completion {
        let proto = match try_completion!(self.get_member(ctor, "prototype")) {
            JsValue::Object(p) => self.get_object(p.id),
            _ => self.object_prototype.clone(),
        };
        let obj = self.create_object_with_proto(proto.as_ref());
        let this_val = Self::object_value(&obj);
        self.new_target = Some(ctor.clone());
        let result = self.call_function(ctor, &this_val, args);
        self.new_target = None;
        match result {
            Completion::Normal(v) if v.is_object() => Completion::Normal(v),
            Completion::Normal(_) => Completion::Normal(this_val),
            other => other,
        }
    }

    /// Calls run on a grown stack segment when the native stack runs low,
    /// so `max_call_depth` is reached before the thread's stack is.
    pub(crate) fn call_function(
        &mut self,
        func_val: &JsValue,
        this_val: &JsValue,
        args: &[JsValue],
    ) -> Completion {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.call_function_inner(func_val, this_val, args)
        })
    }

    fn call_function_inner(
        &mut self,
        func_val: &JsValue,
        this_val: &JsValue,
        args: &[JsValue],
    ) -> Completion {
        let new_target = self.new_target.take();
        let Some(func) = self.callable_of(func_val) else {
            return self.throw_type_error(&format!(
                "{} is not a function",
                typeof_val(func_val, &self.objects)
            ));
        };
        try_result!(self.check_call_depth());
        self.call_depth += 1;
        let result = match func {
            JsFunction::Native(_, _, f, _) => {
                self.new_target = new_target;
                let r = f(self, this_val, args);
                self.new_target = None;
                r
            }
            JsFunction::User { def, closure } => {
                self.call_user_function(&def, &closure, func_val, this_val, args)
            }
        };
        self.call_depth -= 1;
        result
    }
}
