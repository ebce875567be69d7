use super::*;

impl Interpreter {
    /// Activation of a script function: name scope, parameter scope,
    /// optional body scope, then the body.
    pub(crate) fn call_user_function(
        &mut self,
        def: &Rc<FunctionDef>,
        closure: &EnvRef,
        func_val: &JsValue,
        this_val: &JsValue,
        args: &[JsValue],
    ) -> Completion {
        let strict = def.is_strict;
        let mut outer = closure.clone();
        if let Some(name) = def.self_binding_name() {
            let mode = if strict {
                SelfNameMode::ErrorOnWrite
            } else {
                SelfNameMode::SilentIgnore
            };
            let name_env = Environment::new(Some(closure.clone()));
            {
                let mut e = name_env.borrow_mut();
                e.declare(name, BindingKind::SelfName(mode));
                e.initialize(name, func_val.clone());
            }
            outer = name_env;
        }

        let mut param_names = Vec::new();
        for p in &def.params {
            p.bound_names(&mut param_names);
        }
        let wants_arguments = !def.is_arrow() && !param_names.iter().any(|n| n == "arguments");
        let param_env = Environment::new_scope(
            Some(outer),
            ScopeKind::Parameters {
                arguments_object: wants_arguments,
            },
        );
        param_env.borrow_mut().strict = strict;

        if !def.is_arrow() {
            let this_binding = if strict {
                this_val.clone()
            } else if this_val.is_nullish() {
                self.global_object.clone().unwrap_or(JsValue::Undefined)
            } else {
                try_result!(self.to_object(this_val))
            };
            let mut e = param_env.borrow_mut();
            e.declare("this", BindingKind::Const);
            e.initialize("this", this_binding);
        }

        let simple = def.has_simple_params();
        if wants_arguments {
            let mapped = !strict && simple;
            trace!(
                "activation of {:?}: {} arguments object",
                def.name,
                if mapped { "mapped" } else { "unmapped" }
            );
            let arguments = if mapped {
                self.create_arguments_object(args, func_val, Some((&param_env, &param_names)))
            } else {
                self.create_arguments_object(args, func_val, None)
            };
            let mut e = param_env.borrow_mut();
            e.declare("arguments", BindingKind::Var);
            e.initialize("arguments", arguments);
        }

        if let Err(c) = self.bind_parameters(def, args, &param_env, simple, &param_names) {
            return c;
        }

        let body_env = if simple {
            // No initializers ran, so the parameter scope doubles as the
            // function's var scope.
            param_env.borrow_mut().kind = ScopeKind::Function;
            param_env.clone()
        } else {
            trace!("activation of {:?}: separate body scope", def.name);
            self.create_body_env(&def.body, &param_env, &param_names)
        };
        if let Err(e) = self.declaration_instantiation(&def.body, &body_env, &body_env) {
            return Completion::Throw(e);
        }

        match self.exec_statements(&def.body, &body_env) {
            Completion::Return(v) => Completion::Normal(v),
            Completion::Throw(e) => Completion::Throw(e),
            _ => Completion::Normal(JsValue::Undefined),
        }
    }

    /// Binds parameters left to right. Defaults run in the parameter scope,
    /// so they see earlier parameters, `arguments`, `this` and the
    /// function's own name.
    fn bind_parameters(
        &mut self,
        def: &FunctionDef,
        args: &[JsValue],
        param_env: &EnvRef,
        simple: bool,
        param_names: &[String],
    ) -> Result<(), Completion> {
        {
            let kind = if simple {
                BindingKind::Var
            } else {
                BindingKind::Let
            };
            let mut e = param_env.borrow_mut();
            for name in param_names {
                e.declare(name, kind);
            }
        }
        for (i, param) in def.params.iter().enumerate() {
            let comp = if let Pattern::Rest(inner) = param {
                let rest = args.get(i..).unwrap_or(&[]).to_vec();
                let rest_arr = self.create_array(rest);
                self.bind_pattern(inner, rest_arr, param_env, true)
            } else {
                let val = args.get(i).cloned().unwrap_or(JsValue::Undefined);
                self.bind_pattern(param, val, param_env, true)
            };
            if comp.is_abrupt() {
                return Err(comp);
            }
        }
        Ok(())
    }

    /// Body scope for functions whose parameters have their own tier. Body
    /// `var`s named like a parameter, or `arguments` when the function has
    /// an arguments object, start with its value; names an initializer's
    /// eval introduced do not.
    fn create_body_env(
        &mut self,
        body: &[Statement],
        param_env: &EnvRef,
        param_names: &[String],
    ) -> EnvRef {
        let body_env = Environment::new_scope(Some(param_env.clone()), ScopeKind::Function);
        let mut var_names = Vec::new();
        collect_var_names(body, &mut var_names);
        let has_arguments_object = matches!(
            param_env.borrow().kind,
            ScopeKind::Parameters {
                arguments_object: true
            }
        );
        for name in var_names {
            let seeded =
                param_names.contains(&name) || (name == "arguments" && has_arguments_object);
            let inherited = {
                let p = param_env.borrow();
                if seeded && p.has_own(&name) {
                    p.get(&name)
                } else {
                    None
                }
            };
            let mut e = body_env.borrow_mut();
            e.declare(&name, BindingKind::Var);
            if let Some(v) = inherited {
                e.initialize(&name, v);
            }
        }
        body_env
    }

    /// `eval(x)` called through the identifier `eval`. Runs in the caller's
    /// scope; sloppy code hoists its `var`s into the caller's var scope.
    pub(crate) fn direct_eval(&mut self, arg: Option<&JsValue>, env: &EnvRef) -> Completion {
        let caller_strict = env.borrow().strict;
        self.eval_code(arg, env, caller_strict)
    }

    /// `eval` reached any other way: global scope, sloppy unless the code
    /// opts in.
    pub(crate) fn indirect_eval(&mut self, arg: Option<&JsValue>) -> Completion {
        let global = self.global_env.clone();
        self.eval_code(arg, &global, false)
    }

    fn eval_code(&mut self, arg: Option<&JsValue>, env: &EnvRef, caller_strict: bool) -> Completion {
        let source = match arg {
            Some(JsValue::String(s)) => s.to_rust_string(),
            Some(other) => return Completion::Normal(other.clone()),
            None => return Completion::Normal(JsValue::Undefined),
        };
        debug!("eval ({} bytes, strict caller: {caller_strict})", source.len());
        let parsed =
            Parser::new_for_eval(&source, caller_strict).and_then(|mut p| p.parse_program());
        let program = match parsed {
            Ok(p) => p,
            Err(e) => return Completion::Throw(self.create_syntax_error(&e.message)),
        };
        let strict = caller_strict || program.strict;
        let (var_env, lex_env) = if strict {
            let eval_env = Environment::new_scope(Some(env.clone()), ScopeKind::Eval);
            eval_env.borrow_mut().strict = true;
            (eval_env.clone(), eval_env)
        } else {
            let var_env = var_scope(env);
            if matches!(
                var_env.borrow().kind,
                ScopeKind::Parameters {
                    arguments_object: true
                }
            ) {
                let mut names = Vec::new();
                collect_var_names(&program.body, &mut names);
                if names.iter().any(|n| n == "arguments") {
                    return Completion::Throw(self.create_syntax_error(
                        "'arguments' cannot be declared by eval in a parameter initializer",
                    ));
                }
            }
            (var_env, Environment::new(Some(env.clone())))
        };
        if let Err(e) = self.declaration_instantiation(&program.body, &var_env, &lex_env) {
            return Completion::Throw(e);
        }
        self.exec_statements(&program.body, &lex_env)
    }
}
