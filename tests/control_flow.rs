use jscore::{EngineError, Interpreter, JsValue};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .is_test(true)
        .try_init();
}

fn run(src: &str) -> String {
    let mut interp = Interpreter::new();
    match interp.eval_source(src) {
        Ok(v) => interp.value_to_display(&v),
        Err(e) => panic!("{src}: {e}"),
    }
}

fn run_err(src: &str) -> EngineError {
    let mut interp = Interpreter::new();
    match interp.eval_source(src) {
        Ok(v) => panic!("{src}: expected an error, got {v:?}"),
        Err(e) => e,
    }
}

#[test]
fn while_and_do_while() {
    assert_eq!(run("var i = 0, c = 0; while (i < 3) { c++; i++ } c"), "3");
    assert_eq!(
        run("var i = 0, c = 0; while (i < 3) { c++; if (i == 1) break; i++ } [c, i].join()"),
        "2,1"
    );
    assert_eq!(run("var i = 0, c = 0; do { c++; i++ } while (i < 3); [c, i].join()"), "3,3");
    assert_eq!(run("var c = 0; do { c++ } while (false); c"), "1");
}

#[test]
fn for_loops() {
    assert_eq!(run("var i, c = 0; for (i = 0; i < 3; i++) { c++ } [c, i].join()"), "3,3");
    assert_eq!(run("var c = 0; for (var j = 0; j < 3; j++) { c++ } [c, j].join()"), "3,3");
    assert_eq!(run("var n = 0; for (;;) { if (++n == 5) break } n"), "5");
}

#[test]
fn for_let_gives_each_iteration_its_own_binding() {
    assert_eq!(
        run(
            "var fs = []; for (let i = 0; i < 3; i++) { fs.push(function () { return i }) } \
             [fs[0](), fs[1](), fs[2]()].join()"
        ),
        "0,1,2"
    );
    assert_eq!(
        run(
            "var fs = []; for (var i = 0; i < 3; i++) { fs.push(function () { return i }) } \
             [fs[0](), fs[2]()].join()"
        ),
        "3,3"
    );
}

#[test]
fn labeled_break_and_continue() {
    assert_eq!(
        run(
            "var i, c = 0; L1: for (i = 0; i < 3; i++) { c++; if (i == 0) continue; \
             while (1) { break L1; } } [c, i].join()"
        ),
        "2,1"
    );
    assert_eq!(
        run(
            "var s = ''; outer: for (var i = 0; i < 3; i++) { for (var j = 0; j < 3; j++) { \
             if (j == 1) continue outer; s += i + '' + j; } } s"
        ),
        "001020"
    );
    assert_eq!(run("var r = 0; blk: { r = 1; break blk; r = 2; } r"), "1");
    assert_eq!(run("do x: { break x; } while (0); 'ok'"), "ok");
    assert_eq!(run("if (1) x: { break x; } else x: { break x; } 'ok'"), "ok");
    assert_eq!(run("while (0) x: { break x; }; 'ok'"), "ok");
}

#[test]
fn switch_statement() {
    let body = "var i, a, s = ''; for (i = 0; i < 3; i++) { a = '?'; switch (i) { \
                case 0: a = 'a'; break; case 1: a = 'b'; break; default: a = 'c'; break; } \
                s += a; } s + i";
    assert_eq!(run(body), "abc3");

    let with_continue = "var i, a, s = ''; for (i = 0; i < 4; i++) { a = '?'; switch (i) { \
                         case 0: a = 'a'; break; case 1: a = 'b'; break; case 2: continue; \
                         default: a = '' + i; break; } s += a; } s + ':' + i";
    assert_eq!(run(with_continue), "ab3:4");
}

#[test]
fn switch_falls_through_and_uses_strict_equality() {
    assert_eq!(
        run("var s = ''; switch (2) { case 1: s += 'a'; case 2: s += 'b'; case 3: s += 'c'; } s"),
        "bc"
    );
    assert_eq!(
        run("var s = ''; switch ('1') { case 1: s = 'num'; break; default: s = 'def'; } s"),
        "def"
    );
    assert_eq!(
        run("var s = ''; switch (9) { case 1: s += 'a'; default: s += 'd'; case 2: s += 'b'; } s"),
        "db"
    );
    assert_eq!(run("var s = 'x'; switch (9) { case 1: s = 'a'; } s"), "x");
}

#[test]
fn switch_cases_share_one_lexical_scope() {
    assert_eq!(
        run("var r; switch (1) { case 0: let v = 'zero'; case 1: r = typeof f; function f() {} } r"),
        "function"
    );
}

#[test]
fn for_in_enumeration_order() {
    assert_eq!(
        run("var tab = []; for (var i in {x: 1, y: 2}) tab.push(i); tab.toString()"),
        "x,y"
    );
    assert_eq!(
        run(
            "var a = {y: 2, '1': 3}; Object.defineProperty(a, 'x', {value: 1}); \
             Object.setPrototypeOf(a, {x: 3}); var tab = []; for (var i in a) tab.push(i); \
             tab.toString()"
        ),
        "1,y"
    );
    assert_eq!(
        run(
            "var a = []; for (var i = 0; i < 10; i++) a.push(i); var tab = []; \
             for (i in a) tab.push(i); tab.toString()"
        ),
        "0,1,2,3,4,5,6,7,8,9"
    );
    assert_eq!(
        run(
            "var a = {x: 1, y: 2, '1': 3}; Object.setPrototypeOf(a, {'4': 4, x: 0}); \
             var tab = []; for (var k in a) tab.push(k); tab.toString()"
        ),
        "1,x,y,4"
    );
}

#[test]
fn for_in_targets() {
    assert_eq!(
        run("var a = {x: 0}, tab = []; for (a.x in {x: 1, y: 2}) tab.push(a.x); tab.toString()"),
        "x,y"
    );
    assert_eq!(
        run("var a = [0], tab = []; for (a[0] in {x: 1, y: 2}) tab.push(a[0]); tab.toString()"),
        "x,y"
    );
    assert_eq!(
        run("var tab = []; for (var k = 2 in {x: 1, y: 2}) tab.push(k); tab.toString()"),
        "x,y"
    );
    assert_eq!(run("var k = 0; for (var k = 2 in {}) ; k"), "2");
    assert_eq!(
        run(
            "var fs = []; for (let k in {a: 1, b: 2}) fs.push(function () { return k }); \
             fs[0]() + fs[1]()"
        ),
        "ab"
    );
}

#[test]
fn for_in_edge_cases() {
    assert_eq!(run("var n = 0; for (var k in null) n++; for (k in undefined) n++; n"), "0");
    assert_eq!(run("var s = ''; for (var k in 'ab') s += k; s"), "01");
    assert_eq!(
        run(
            "var o = {a: 1, b: 2, c: 3}, seen = []; \
             for (var k in o) { seen.push(k); delete o.b; } seen.toString()"
        ),
        "a,c"
    );
    assert_eq!(
        run(
            "var tab = []; for (var i in {x: 1, y: 2, z: 3}) { if (i === 'y') continue; \
             tab.push(i) } tab.toString()"
        ),
        "x,z"
    );
    assert_eq!(
        run(
            "var tab = []; for (var i in {x: 1, y: 2, z: 3}) { if (i === 'z') break; \
             tab.push(i) } tab.toString()"
        ),
        "x,y"
    );
}

#[test]
fn try_catch_finally() {
    assert_eq!(run("var s = ''; try { s += 't' } catch (e) { s += 'c' } finally { s += 'f' } s"), "tf");
    assert_eq!(
        run("var s = ''; try { s += 't'; throw 'c' } catch (e) { s += e } finally { s += 'f' } s"),
        "tcf"
    );
    assert_eq!(
        run("var s = ''; for (;;) { try { s += 't'; break; s += 'b' } finally { s += 'f' } } s"),
        "tf"
    );
    assert_eq!(
        run(
            "var s = ''; try { try { s += 't'; throw 'a' } finally { s += 'f' } } \
             catch (e) { s += e } finally { s += 'g' } s"
        ),
        "tfag"
    );
    assert_eq!(
        run(
            "var s = ''; for (var i in {x: 1, y: 2}) { try { s += i; throw 'a' } \
             catch (e) { s += e } finally { s += 'f' } } s"
        ),
        "xafyaf"
    );
}

#[test]
fn finally_overrides_only_when_abrupt() {
    assert_eq!(
        run("function f() { try { return 1 } finally { 'ignored' } } f()"),
        "1"
    );
    assert_eq!(run("function f() { try { return 1 } finally { return 2 } } f()"), "2");
    assert_eq!(
        run("function f() { try { throw 1 } finally { return 'swallowed' } } f()"),
        "swallowed"
    );
    assert_eq!(
        run("var n = 0; while (true) { try { n++; continue } finally { if (n > 2) break } } n"),
        "3"
    );
    assert_eq!(
        run(
            "var s = ''; function f() { try { s += 't'; return 1 } finally { s += 'f' } } \
             [f(), s].join()"
        ),
        "1,tf"
    );
}

#[test]
fn catch_binding_is_scoped_to_the_handler() {
    assert_eq!(run("var e = 'outer'; try { throw 'inner' } catch (e) { } e"), "outer");
    assert_eq!(run("try { throw {a: 1, b: 2} } catch ({a, b}) { a + b }"), "3");
    assert_eq!(run("try { throw 1 } catch { 'no binding' }"), "no binding");
}

#[test]
fn uncaught_throw_escapes_with_its_value() {
    match run_err("throw 'boom'") {
        EngineError::Uncaught { value, rendered } => {
            assert!(matches!(value, JsValue::String(_)));
            assert_eq!(rendered, "boom");
        }
        other => panic!("unexpected {other:?}"),
    }
    let err = run_err("throw new TypeError('bad')");
    assert_eq!(err.to_string(), "Uncaught TypeError: bad");
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn completion_values() {
    assert_eq!(run("1; var x = 2;"), "1");
    assert_eq!(run("1; function f() {}"), "1");
    assert_eq!(run("'a'; if (false) 'b';"), "undefined");
    assert_eq!(run("var i = 0; while (i < 2) { i++; 'loop' + i }"), "loop2");
    assert_eq!(run("2; ;"), "2");
}

#[test]
fn block_scoping() {
    assert_eq!(run("let a = 1; { let a = 2; } a"), "1");
    assert_eq!(run("var a = 1; { var a = 2; } a"), "2");
    assert_eq!(run("{ function inner() { return 'in' } } typeof inner"), "undefined");
    assert!(matches!(
        run_err("{ x; let x = 1; }"),
        EngineError::Uncaught { .. }
    ));
}
