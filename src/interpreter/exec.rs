use super::*;

/// Names declared with `var` anywhere in `stmts`, not looking into nested
/// functions.
pub(crate) fn collect_var_names(stmts: &[Statement], names: &mut Vec<String>) {
    for stmt in stmts {
        collect_var_names_in(stmt, names);
    }
}

fn collect_var_names_in(stmt: &Statement, names: &mut Vec<String>) {
    match stmt {
        Statement::Decl(decl) if !decl.kind.is_lexical() => {
            for d in &decl.bindings {
                d.pattern.bound_names(names);
            }
        }
        Statement::Block(body) => collect_var_names(body, names),
        Statement::If(s) => {
            collect_var_names_in(&s.then_branch, names);
            if let Some(alt) = &s.else_branch {
                collect_var_names_in(alt, names);
            }
        }
        Statement::While(s) => collect_var_names_in(&s.body, names),
        Statement::DoWhile(s) => collect_var_names_in(&s.body, names),
        Statement::For(s) => {
            if let Some(ForInit::Decl(decl)) = &s.init
                && !decl.kind.is_lexical()
            {
                for d in &decl.bindings {
                    d.pattern.bound_names(names);
                }
            }
            collect_var_names_in(&s.body, names);
        }
        Statement::ForIn(s) => {
            if let ForInTarget::Decl(decl) = &s.target
                && !decl.kind.is_lexical()
            {
                for d in &decl.bindings {
                    d.pattern.bound_names(names);
                }
            }
            collect_var_names_in(&s.body, names);
        }
        Statement::Try(t) => {
            collect_var_names(&t.block, names);
            if let Some(handler) = &t.catch_clause {
                collect_var_names(&handler.body, names);
            }
            if let Some(fin) = &t.finally_block {
                collect_var_names(fin, names);
            }
        }
        Statement::Switch(s) => {
            for case in &s.cases {
                collect_var_names(&case.body, names);
            }
        }
        Statement::Labeled(_, body) => collect_var_names_in(body, names),
        _ => {}
    }
}

/// Whether a statement contributes to the completion value of a list.
fn produces_value(stmt: &Statement) -> bool {
    !matches!(
        stmt,
        Statement::Empty
            | Statement::Decl(_)
            | Statement::Function(_)
            | Statement::Debugger
    )
}

impl Interpreter {
    /// Hoisting for a script, function body or eval: `var` names and
    /// top-level functions land in `var_env`, `let`/`const` in `lex_env`.
    pub(crate) fn declaration_instantiation(
        &mut self,
        stmts: &[Statement],
        var_env: &EnvRef,
        lex_env: &EnvRef,
    ) -> Result<(), JsValue> {
        let mut names = Vec::new();
        collect_var_names(stmts, &mut names);
        {
            let mut e = var_env.borrow_mut();
            for name in &names {
                e.declare(name, BindingKind::Var);
            }
        }
        for stmt in stmts {
            match stmt {
                Statement::Function(def) => {
                    let func = self.instantiate_function(def, lex_env);
                    if let Some(name) = &def.name {
                        let mut e = var_env.borrow_mut();
                        e.declare(name, BindingKind::Var);
                        e.initialize(name, func);
                    }
                }
                Statement::Decl(decl) if decl.kind.is_lexical() => {
                    self.declare_lexical(decl, lex_env);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn declare_lexical(&mut self, decl: &VarDecl, env: &EnvRef) {
        let kind = if decl.kind == VarKind::Const {
            BindingKind::Const
        } else {
            BindingKind::Let
        };
        let mut names = Vec::new();
        for d in &decl.bindings {
            d.pattern.bound_names(&mut names);
        }
        let mut e = env.borrow_mut();
        for name in &names {
            e.declare(name, kind);
        }
    }

    /// Block-level declarations: `let`, `const` and function declarations.
    fn block_declaration_instantiation<'s>(
        &mut self,
        stmts: impl IntoIterator<Item = &'s Statement>,
        env: &EnvRef,
    ) {
        for stmt in stmts {
            match stmt {
                Statement::Function(def) => {
                    let func = self.instantiate_function(def, env);
                    if let Some(name) = &def.name {
                        let mut e = env.borrow_mut();
                        e.declare(name, BindingKind::Let);
                        e.initialize(name, func);
                    }
                }
                Statement::Decl(decl) if decl.kind.is_lexical() => {
                    self.declare_lexical(decl, env);
                }
                _ => {}
            }
        }
    }

    /// Runs a statement list; the value is that of the last statement that
    /// produced one.
    pub(crate) fn exec_statements(&mut self, stmts: &[Statement], env: &EnvRef) -> Completion {
        let mut result = JsValue::Undefined;
        for stmt in stmts {
            match self.exec_statement(stmt, env) {
                Completion::Normal(val) => {
                    if produces_value(stmt) {
                        result = val;
                    }
                }
                other => return other,
            }
        }
        Completion::Normal(result)
    }

    pub(crate) fn exec_statement(&mut self, stmt: &Statement, env: &EnvRef) -> Completion {
        self.exec_labelled_statement(stmt, env, &[])
    }

    /// `labels` are the labels directly enclosing `stmt`. Loops use them as
    /// their label set; other statements ignore them.
    fn exec_labelled_statement(
        &mut self,
        stmt: &Statement,
        env: &EnvRef,
        labels: &[String],
    ) -> Completion {
        match stmt {
            Statement::Labeled(label, body) => {
                let mut set = labels.to_vec();
                set.push(label.clone());
                match self.exec_labelled_statement(body, env, &set) {
                    Completion::Break(Some(l)) if l == *label => {
                        Completion::Normal(JsValue::Undefined)
                    }
                    other => other,
                }
            }
            Statement::While(w) => self.exec_while(w, env, labels),
            Statement::DoWhile(dw) => self.exec_do_while(dw, env, labels),
            Statement::For(f) => self.exec_for(f, env, labels),
            Statement::ForIn(fi) => self.exec_for_in(fi, env, labels),
            _ => self.exec_simple_statement(stmt, env),
        }
    }

    fn exec_simple_statement(&mut self, stmt: &Statement, env: &EnvRef) -> Completion {
        match stmt {
            Statement::Empty | Statement::Debugger | Statement::Function(_) => {
                Completion::Normal(JsValue::Undefined)
            }
            Statement::Expression(expr) => self.eval_expr(expr, env),
            Statement::Block(stmts) => self.exec_block(stmts, env),
            Statement::Decl(decl) => self.exec_variable_declaration(decl, env),
            Statement::If(if_stmt) => {
                let test = try_completion!(self.eval_expr(&if_stmt.test, env));
                if to_boolean(&test) {
                    self.exec_statement(&if_stmt.then_branch, env)
                } else if let Some(alt) = &if_stmt.else_branch {
                    self.exec_statement(alt, env)
                } else {
                    Completion::Normal(JsValue::Undefined)
                }
            }
            Statement::Return(expr) => {
                let val = match expr {
                    Some(e) => try_completion!(self.eval_expr(e, env)),
                    None => JsValue::Undefined,
                };
                Completion::Return(val)
            }
            Statement::Break(label) => Completion::Break(label.clone()),
            Statement::Continue(label) => Completion::Continue(label.clone()),
            Statement::Throw(expr) => {
                let val = try_completion!(self.eval_expr(expr, env));
                Completion::Throw(val)
            }
            Statement::Try(t) => self.exec_try(t, env),
            Statement::Switch(s) => self.exec_switch(s, env),
            Statement::Labeled(..)
            | Statement::While(_)
            | Statement::DoWhile(_)
            | Statement::For(_)
            | Statement::ForIn(_) => self.exec_labelled_statement(stmt, env, &[]),
        }
    }

    fn exec_block(&mut self, stmts: &[Statement], env: &EnvRef) -> Completion {
        let block_env = Environment::new(Some(env.clone()));
        self.block_declaration_instantiation(stmts, &block_env);
        self.exec_statements(stmts, &block_env)
    }

    fn exec_variable_declaration(&mut self, decl: &VarDecl, env: &EnvRef) -> Completion {
        for d in &decl.bindings {
            if !decl.kind.is_lexical() {
                let Some(init) = &d.init else {
                    continue;
                };
                let val = match &d.pattern {
                    Pattern::Identifier(name) => try_completion!(self.eval_named(init, name, env)),
                    _ => try_completion!(self.eval_expr(init, env)),
                };
                try_completion!(self.bind_pattern(&d.pattern, val, env, false));
            } else {
                let val = match (&d.init, &d.pattern) {
                    (Some(init), Pattern::Identifier(name)) => {
                        try_completion!(self.eval_named(init, name, env))
                    }
                    (Some(init), _) => try_completion!(self.eval_expr(init, env)),
                    (None, _) => JsValue::Undefined,
                };
                try_completion!(self.bind_pattern(&d.pattern, val, env, true));
            }
        }
        Completion::Normal(JsValue::Undefined)
    }

    /// Binds `val` to `pat`. With `init` set, identifiers are initialized
    /// in `env` itself (declarations, parameters); otherwise they are
    /// assigned through the scope chain.
    pub(crate) fn bind_pattern(
        &mut self,
        pat: &Pattern,
        val: JsValue,
        env: &EnvRef,
        init: bool,
    ) -> Completion {
        match pat {
            Pattern::Identifier(name) => {
                if init {
                    env.borrow_mut().initialize(name, val);
                    Completion::Normal(JsValue::Undefined)
                } else {
                    self.assign_to_name(name, val, env)
                }
            }
            Pattern::Member(target) => self.assign_to_target(target, val, env),
            Pattern::Assign(inner, default) => {
                let val = if val.is_undefined() {
                    match inner.as_ref() {
                        Pattern::Identifier(name) => {
                            try_completion!(self.eval_named(default, name, env))
                        }
                        _ => try_completion!(self.eval_expr(default, env)),
                    }
                } else {
                    val
                };
                self.bind_pattern(inner, val, env, init)
            }
            Pattern::Array(elems) => {
                if val.is_nullish() {
                    return self.throw_type_error(&format!("{val} is not iterable"));
                }
                let source = try_result!(self.to_object(&val));
                let len_val = try_completion!(self.get_member(&source, "length"));
                let len = to_number(&len_val);
                let len = if len.is_nan() || len < 0.0 { 0 } else { len as usize };
                for (i, elem) in elems.iter().enumerate() {
                    let Some(elem) = elem else {
                        continue;
                    };
                    if let Pattern::Rest(inner) = elem {
                        let mut rest = Vec::new();
                        for j in i..len {
                            rest.push(try_completion!(self.get_member(&source, &j.to_string())));
                        }
                        let arr = self.create_array(rest);
                        return self.bind_pattern(inner, arr, env, init);
                    }
                    let item = try_completion!(self.get_member(&source, &i.to_string()));
                    try_completion!(self.bind_pattern(elem, item, env, init));
                }
                Completion::Normal(JsValue::Undefined)
            }
            Pattern::Object(props) => {
                if val.is_nullish() {
                    return self.throw_type_error(&format!("Cannot destructure '{val}'"));
                }
                for prop in props {
                    match prop {
                        PatternProp::Shorthand(name) => {
                            let item = try_completion!(self.get_member(&val, name));
                            let target = Pattern::Identifier(name.clone());
                            try_completion!(self.bind_pattern(&target, item, env, init));
                        }
                        PatternProp::KeyValue(key, target) => {
                            let key = match key {
                                PropertyKey::Identifier(n) | PropertyKey::String(n) => n.clone(),
                                PropertyKey::Number(n) => number_ops::to_string(*n),
                                PropertyKey::Computed(expr) => {
                                    let k = try_completion!(self.eval_expr(expr, env));
                                    try_result!(self.to_property_key(&k))
                                }
                            };
                            let item = try_completion!(self.get_member(&val, &key));
                            try_completion!(self.bind_pattern(target, item, env, init));
                        }
                    }
                }
                Completion::Normal(JsValue::Undefined)
            }
            Pattern::Rest(inner) => self.bind_pattern(inner, val, env, init),
        }
    }

    /// Decides what a loop does with its body's completion. `None` keeps
    /// looping; `Some` leaves the loop with that completion.
    fn loop_exit(comp: Completion, labels: &[String], last: &mut JsValue) -> Option<Completion> {
        match comp {
            Completion::Normal(v) => {
                *last = v;
                None
            }
            Completion::Continue(None) => None,
            Completion::Continue(Some(l)) if labels.contains(&l) => None,
            Completion::Break(None) => Some(Completion::Normal(last.clone())),
            Completion::Break(Some(l)) if labels.contains(&l) => {
                Some(Completion::Normal(last.clone()))
            }
            other => Some(other),
        }
    }

    fn exec_while(&mut self, w: &WhileStmt, env: &EnvRef, labels: &[String]) -> Completion {
        let mut last = JsValue::Undefined;
        loop {
            let test = try_completion!(self.eval_expr(&w.test, env));
            if !to_boolean(&test) {
                return Completion::Normal(last);
            }
            let comp = self.exec_statement(&w.body, env);
            if let Some(exit) = Self::loop_exit(comp, labels, &mut last) {
                return exit;
            }
        }
    }

    fn exec_do_while(
        &mut self,
        dw: &DoWhileStmt,
        env: &EnvRef,
        labels: &[String],
    ) -> Completion {
        let mut last = JsValue::Undefined;
        loop {
            let comp = self.exec_statement(&dw.body, env);
            if let Some(exit) = Self::loop_exit(comp, labels, &mut last) {
                return exit;
            }
            let test = try_completion!(self.eval_expr(&dw.test, env));
            if !to_boolean(&test) {
                return Completion::Normal(last);
            }
        }
    }

    /// Copies the loop's `let` bindings into a fresh scope so closures from
    /// each iteration see their own values.
    fn copy_iteration_env(current: &EnvRef, names: &[String], outer: &EnvRef) -> EnvRef {
        let next = Environment::new(Some(outer.clone()));
        {
            let cur = current.borrow();
            let mut e = next.borrow_mut();
            for name in names {
                if let Some(binding) = cur.bindings.get(name) {
                    e.bindings.insert(name.clone(), binding.clone());
                }
            }
        }
        next
    }

    fn exec_for(&mut self, f: &ForStmt, env: &EnvRef, labels: &[String]) -> Completion {
        let mut loop_env = env.clone();
        let mut per_iteration = Vec::new();
        match &f.init {
            Some(ForInit::Decl(decl)) if decl.kind.is_lexical() => {
                loop_env = Environment::new(Some(env.clone()));
                self.declare_lexical(decl, &loop_env);
                try_completion!(self.exec_variable_declaration(decl, &loop_env));
                if decl.kind == VarKind::Let {
                    for d in &decl.bindings {
                        d.pattern.bound_names(&mut per_iteration);
                    }
                }
            }
            Some(ForInit::Decl(decl)) => {
                try_completion!(self.exec_variable_declaration(decl, env));
            }
            Some(ForInit::Expression(expr)) => {
                try_completion!(self.eval_expr(expr, env));
            }
            None => {}
        }
        if !per_iteration.is_empty() {
            loop_env = Self::copy_iteration_env(&loop_env, &per_iteration, env);
        }
        let mut last = JsValue::Undefined;
        loop {
            if let Some(test) = &f.test {
                let t = try_completion!(self.eval_expr(test, &loop_env));
                if !to_boolean(&t) {
                    return Completion::Normal(last);
                }
            }
            let comp = self.exec_statement(&f.body, &loop_env);
            if let Some(exit) = Self::loop_exit(comp, labels, &mut last) {
                return exit;
            }
            if !per_iteration.is_empty() {
                loop_env = Self::copy_iteration_env(&loop_env, &per_iteration, env);
            }
            if let Some(update) = &f.update {
                try_completion!(self.eval_expr(update, &loop_env));
            }
        }
    }

    fn exec_for_in(&mut self, fi: &ForInStmt, env: &EnvRef, labels: &[String]) -> Completion {
        // `for (var k = init in o)` assigns the initializer before the
        // subject is evaluated.
        if let ForInTarget::Decl(decl) = &fi.target
            && !decl.kind.is_lexical()
            && let Some(d) = decl.bindings.first()
            && d.init.is_some()
        {
            try_completion!(self.exec_variable_declaration(decl, env));
        }
        let subject = try_completion!(self.eval_expr(&fi.object, env));
        if subject.is_nullish() {
            return Completion::Normal(JsValue::Undefined);
        }
        let obj_val = try_result!(self.to_object(&subject));
        let Some(obj) = self.object_of(&obj_val) else {
            return Completion::Normal(JsValue::Undefined);
        };
        let keys = obj.borrow().enumerable_keys_with_proto();
        trace!("for-in over {} keys", keys.len());

        let mut last = JsValue::Undefined;
        for key in keys {
            if !obj.borrow().has_property(&key) {
                continue;
            }
            let key_val = JsValue::str(&key);
            let iter_env = match &fi.target {
                ForInTarget::Decl(decl) if decl.kind.is_lexical() => {
                    let iter_env = Environment::new(Some(env.clone()));
                    self.declare_lexical(decl, &iter_env);
                    if let Some(d) = decl.bindings.first() {
                        try_completion!(self.bind_pattern(&d.pattern, key_val, &iter_env, true));
                    }
                    iter_env
                }
                ForInTarget::Decl(decl) => {
                    if let Some(d) = decl.bindings.first() {
                        try_completion!(self.bind_pattern(&d.pattern, key_val, env, false));
                    }
                    env.clone()
                }
                ForInTarget::Pattern(pat) => {
                    try_completion!(self.bind_pattern(pat, key_val, env, false));
                    env.clone()
                }
            };
            let comp = self.exec_statement(&fi.body, &iter_env);
            if let Some(exit) = Self::loop_exit(comp, labels, &mut last) {
                return exit;
            }
        }
        Completion::Normal(last)
    }

    fn exec_try(&mut self, t: &TryStmt, env: &EnvRef) -> Completion {
        let mut result = self.exec_block(&t.block, env);
        let thrown = match &result {
            Completion::Throw(e) => Some(e.clone()),
            _ => None,
        };
        if let Some(exception) = thrown
            && let Some(handler) = &t.catch_clause
        {
            let catch_env = Environment::new(Some(env.clone()));
            result = match &handler.param {
                Some(param) => {
                    let mut names = Vec::new();
                    param.bound_names(&mut names);
                    for name in &names {
                        catch_env.borrow_mut().declare(name, BindingKind::Let);
                    }
                    match self.bind_pattern(param, exception, &catch_env, true) {
                        Completion::Normal(_) => self.exec_block(&handler.body, &catch_env),
                        abrupt => abrupt,
                    }
                }
                None => self.exec_block(&handler.body, &catch_env),
            };
        }
        if let Some(finalizer) = &t.finally_block {
            let fin = self.exec_block(finalizer, env);
            if fin.is_abrupt() {
                return fin;
            }
        }
        result
    }

    fn exec_switch(&mut self, s: &SwitchStmt, env: &EnvRef) -> Completion {
        let discriminant = try_completion!(self.eval_expr(&s.subject, env));
        let block_env = Environment::new(Some(env.clone()));
        self.block_declaration_instantiation(
            s.cases.iter().flat_map(|c| c.body.iter()),
            &block_env,
        );

        let mut start = None;
        for (i, case) in s.cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let v = try_completion!(self.eval_expr(test, &block_env));
                if strict_equality(&discriminant, &v) {
                    start = Some(i);
                    break;
                }
            }
        }
        let start = match start.or_else(|| s.cases.iter().position(|c| c.test.is_none())) {
            Some(i) => i,
            None => return Completion::Normal(JsValue::Undefined),
        };

        let mut last = JsValue::Undefined;
        for case in &s.cases[start..] {
            for stmt in &case.body {
                match self.exec_statement(stmt, &block_env) {
                    Completion::Normal(v) => {
                        if produces_value(stmt) {
                            last = v;
                        }
                    }
                    Completion::Break(None) => return Completion::Normal(last),
                    other => return other,
                }
            }
        }
        Completion::Normal(last)
    }
}
