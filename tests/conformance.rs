//! The language and loop suites, one test per suite function.

use jscore::{EngineError, Interpreter};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .is_test(true)
        .try_init();
}

const LANGUAGE_SUITE: &str = r#"function test_op1()
{
    var r, a;
    r = 1 + 2;
    assert(r == 3, "1 + 2 === 3");

    r = 1 - 2;
    assert(r == -1, "1 - 2 === -1");

    r = -1;
    assert(r == -1, "-1 === -1");

    r = +2;
    assert(r == 2, "+2 === 2");

    r = 2 * 3;
    assert(r == 6, "2 * 3 === 6");

    r = 4 / 2;
    assert(r == 2, "4 / 2 === 2");

    r = 4 % 3;
    assert(r == 1, "4 % 3 === 3");

    r = 4 << 2;
    assert(r == 16, "4 << 2 === 16");

    r = 1 << 0;
    assert(r == 1, "1 << 0 === 1");

    r = 1 << 31;
    assert(r == 2147483648, "1 << 31 === 2147483648");

    r = 1 << 32;
    assert(r == 1, "1 << 32 === 1");

    r = (1 << 31) > 0;
    assert(r == true, "(1 << 31) > 0 === true");

    r = -4 >> 1;
    assert(r == -2, "-4 >> 1 === -2");

    // FIXME 
    //r = -4 >>> 1;
    //assert(r == 0x7ffffffe, "-4 >>> 1 === 0x7ffffffe");

    r = 1 & 1;
    assert(r == 1, "1 & 1 === 1");

    r = 0 | 1;
    assert(r == 1, "0 | 1 === 1");

    r = 1 ^ 1;
    assert(r == 0, "1 ^ 1 === 0");

    r = ~1;
    assert(r == -2, "~1 === -2");

    r = !1;
    assert(r == false, "!1 === false");

    assert((1 < 2) == true, "(1 < 2) === true");

    assert((2 > 1) == true, "(2 > 1) === true");

    assert(('b' > 'a') == true, "('b' > 'a') === true");

    println("-------- END TESTING -----------");
}

function test_cvt()
{    
    assert((NaN | 0) === 0);
    assert((Infinity | 0) === 0);
    assert(((-Infinity) | 0) === 0);

    assert(("12345" | 0) === 12345);    
    assert(("0x12345" | 0) === 0x12345);
    
    assert(("12345" >>> 0) === 12345);
    assert(("0x12345" >>> 0) === 0x12345);
    
    assert((NaN >>> 0) === 0);
    assert((Infinity >>> 0) === 0);
    assert(((-Infinity) >>> 0) === 0);

    assert(null == undefined);
    assert(undefined == null);

    assert("123" == 123);
    assert("122" != 123);

    // FIXME
    // assert(((4294967296 * 3 - 4) | 0) === -4);
    // assert(((4294967296 * 3 - 4) >>> 0) === (4294967296 - 4));

    println("-------- END TESTING -----------");
}

function test_inc_dec()
{
    var a, r;
            
    a = 1;
    r = a++;
    assert(r === 1 && a === 2, "++1");

    a = 1;
    r = ++a;
    assert(r === 2 && a === 2, "++2");

    a = 1;
    r = a--;
    assert(r === 1 && a === 0, "--1");

    a = 1;
    r = --a;
    assert(r === 0 && a === 0, "--2");

    a = {x:true};    
    a.x ++;
    assert(a.x == 2, "true++");

    a = {x:true};
    a.x--;
    assert(a.x == 0, "true--");

    a = [true];
    a[0]++;
    assert(a[0] == 2, "++4");

    a = {x:true};
    r = a.x++;
    assert(r === 1 && a.x === 2, "++5");

    a = {x:true};
    r = a.x--;
    assert(r === 1 && a.x === 0, "--4");

    a = [true];
    r = a[0]++;
    assert(r === 1 && a[0] === 2, "++6");

    a = [true];
    r = --a[0];
    a[0]--;
    assert(r === 0 && a[0] === -1, "--5");

    println("-------- END TESTING -----------");
}

function test_op2()
{
    function F(x)
    {
        this.x = x;
    }

    var a, b;
    a = new Object();
    a.x = 1;
    assert(a.x == 1, "new 1");
    b = new F(2);
    assert(b.x == 2, "new 2");

    a = {};
    b = "Hello";
    assert((a instanceof Object) == true, "instanceof 1");
    assert((b instanceof Object) == true, "instanceof 2");
    assert((a instanceof String) == false, "instanceof 3");
    assert((b instanceof String) == true, "instanceof 4");


    assert((typeof 1) == "number", "typeof 1");
    assert((typeof Object) == "function", "typeof 2");
    assert((typeof null) == "object", "typeof 3");
    assert((typeof unknown_var) == "undefined", "typeof 4");

    println("-------- END TESTING -----------");
}

function test_delete()
{
    var a, err;

    a = {x: 1, y: 1};
    assert(("x" in a) == true, "in operator 1");
    assert((delete a.x) == true, "delete 1");
    assert(("x" in a) == false, "in operator 2");
    
    err = false;
    try {
        delete null.a;
    } catch(e) {
        err = (e instanceof Exception);
    }
    assert(err == true, "delete");

    println("-------- END TESTING -----------");
}

function test_arguments()
{
    function f2() {
        assert(arguments.length == 2, "arguments 1");
        assert(arguments[0] == 1, "arguments 2");
        assert(arguments[1] == 3, "arguments 3");
    }
    f2(1, 3);

    assert(f2.prototype.constructor === f, "prototype");

    println("-------- END TESTING -----------");
}

function test_object_literal()
{
    var a = {
        'x':    1234,
        'y':    4321,
        'z':    5678,
    }
    assert(a.x == 1234, "object literal 1");
    assert(a.z == 5678, "object literal 2");

    var b = {
        'x':    1234,
        'y':    {
            'y':    4321
        },
        'z':    5678,
    }
    assert(b.x == 1234, "object literal 3");
    assert(b.z == 5678, "object literal 4");
    assert(b.y.y == 4321, "object literal 5");

    println("-------- END TESTING -----------");
}


function test_labels()
{
    do x: { break x; } while(0);
    
    if (1)
        x: { break x; }
    else
        x: { break x; }

    while (0) x: { 
        break x; 
    };
}


function test_argument_scope()
{
    var f;
    var c = "global";
    
    f = function(a = eval("var arguments")) {};
    assert_throws(SyntaxError, f);

    f = function(a = eval("1"), b = arguments[0]) { return b; };
    assert(f(12), 12);

    f = function(a, b = arguments[0]) { return b; };
    assert(f(12), 12);

    f = function(a, b = () => arguments) { return b; };
    assert(f(12)()[0], 12);

    f = function(a = eval("1"), b = () => arguments) { return b; };
    assert(f(12)()[0], 12);

    (function() {
        "use strict";
        f = function(a = this) { return a; };
        assert(f.call(123), 123);

        f = function f(a = f) { return a; };
        assert(f(), f);

        f = function f(a = eval("f")) { return a; };
        assert(f(), f);
    })();

    f = (a = eval("var c = 1"), peek = () => c) => {
        var c = 2;
        assert(c, 2);
        assert(peek(), 1);
    }
    f();

    f = (a = eval("var arguments = 1"), peek = () => arguments) => {
        var arguments = 2;
        assert(arguments, 2);
        assert(peek(), 1);
    }
    f();

    f = function f(a = eval("var c = 1"), b = c, peek = () => c) {
        assert(b, 1);
        assert(c, 1);
        assert(peek(), 1)
    }
    f();

    assert(c, "global");
    f = function f(a, b = c, peek = () => c) {
        eval("var c = 1");
        assert(c, 1);
        assert(b, "global");
        assert(peek(), "global")
    }
    f();
    assert(c, "global");

    f = function f(a = eval("var c = 1"), peek = (d = eval("c")) => d) {
        assert(peek(), 1)
    }
    f();
}

function test_function_expr_name()
{
    var f;

    /* non strict mode test : assignment to the function name silently
       fails */
    
    f = function myfunc() {
        myfunc = 1;
        return myfunc;
    };
    assert(f(), f);

    f = function myfunc() {
        myfunc = 1;
        (() => {
            myfunc = 1;
        })();
        return myfunc;
    };
    assert(f(), f);

    f = function myfunc() {
        eval("myfunc = 1");
        return myfunc;
    };
    assert(f(), f);
    
    /* strict mode test : assignment to the function name raises a
       TypeError exception */

    f = function myfunc() {
        "use strict";
        myfunc = 1;
    };
    assert_throws(TypeError, f);

    f = function myfunc() {
        "use strict";
        (() => {
            myfunc = 1;
        })();
    };
    assert_throws(TypeError, f);

    f = function myfunc() {
        "use strict";
        eval("myfunc = 1");
    };
    assert_throws(TypeError, f);
}
"#;

const LOOP_SUITE: &str = r#"function test_while()
{
    var i, c;
    i = 0;
    c = 0;
    while (i < 3) {
        c++;
        i++;
    }
    assert(c === 3, "while 1");
}

function test_while_break()
{
    var i, c;
    i = 0;
    c = 0;
    while (i < 3) {
        c++;
        if (i == 1)
            break;
        i++;
    }
    assert(c === 2 && i === 1, "while break 1");
}

function test_do_while()
{
    var i, c;
    i = 0;
    c = 0;
    do {
        c++;
        i++;
    } while (i < 3);
    assert(c === 3 && i === 3, "do while 1");
}

function test_for()
{
    var i, c;
    c = 0;
    for(i = 0; i < 3; i++) {
        c++;
    }
    assert(c === 3 && i === 3, "for 1");

    c = 0;
    for(var j = 0; j < 3; j++) {
        c++;
    }
    assert(c === 3 && j === 3, "for 2");
}

function test_for_in()
{
    var i, tab, a, b;

    tab = [];
    for(i in {x:1, y: 2}) {
        tab.push(i);
    }
    assert( tab[1] == "y" && tab[0] == "x", "for in 1");

    /* prototype chain test */
    a = {x:1, y: 2, "1": 3};
    b = {"4" : 4 };
    Object.setPrototypeOf(a, b);
    println(a["4"]);

    /* non enumerable properties hide enumerables ones in the
       prototype chain */
    a = {y: 2, "1": 3};
    Object.defineProperty(a, "x", { value: 1 });
    b = {"x" : 3 };
    Object.setPrototypeOf(a, b);
    tab = [];
    for(i in a) {
        tab.push(i);
    }
    assert(tab.toString(), "1,y", "for_in");

    /* array optimization */
    a = [];
    for(i = 0; i < 10; i++)
        a.push(i);
    tab = [];
    for(i in a) {
        tab.push(i);
    }
    assert(tab.toString(), "0,1,2,3,4,5,6,7,8,9", "for_in");

    /* iterate with a field */
    a={x:0};
    tab = [];
    for(a.x in {x:1, y: 2}) {
        tab.push(a.x);
    }
    assert(tab.toString(), "x,y", "for_in");

    /* iterate with a variable field */
    a=[0];
    tab = [];
    for(a[0] in {x:1, y: 2}) {
        tab.push(a[0]);
    }
    assert(tab.toString(), "x,y", "for_in");

    /* variable definition in the for in */
    tab = [];
    for(var j in {x:1, y: 2}) {
        tab.push(j);
    }
    assert(tab.toString(), "x,y", "for_in");

    /* variable assigment in the for in */
    tab = [];
    for(var k = 2 in {x:1, y: 2}) {
        tab.push(k);
    }
    assert(tab.toString(), "x,y", "for_in");
}

function test_for_in2()
{
    var i;
    tab = [];
    for(i in {x:1, y: 2, z:3}) {
        if (i === "y")
            continue;
        tab.push(i);
    }
    assert(tab.toString() == "x,z");

    tab = [];
    for(i in {x:1, y: 2, z:3}) {
        if (i === "z")
            break;
        tab.push(i);
    }
    assert(tab.toString() == "x,y");
}

function test_for_break()
{
    var i, c;
    c = 0;
    L1: for(i = 0; i < 3; i++) {
        c++;
        if (i == 0)
            continue;
        while (1) {
            break L1;
        }
    }
    assert(c === 2 && i === 1);
}

function test_switch1()
{
    var i, a, s;
    s = "";
    for(i = 0; i < 3; i++) {
        a = "?";
        switch(i) {
        case 0:
            a = "a";
            break;
        case 1:
            a = "b";
            break;
        default:
            a = "c";
            break;
        }
        s += a;
    }
    assert(s === "abc" && i === 3);
}

function test_switch2()
{
    var i, a, s;
    s = "";
    for(i = 0; i < 4; i++) {
        a = "?";
        switch(i) {
        case 0:
            a = "a";
            break;
        case 1:
            a = "b";
            break;
        case 2:
            continue;
        default:
            a = "" + i;
            break;
        }
        s += a;
    }
    assert(s === "ab3" && i === 4);
}

function test_try_catch1()
{
    try {
        throw "hello";
    } catch (e) {
        assert(e, "hello", "catch");
        return;
    }
    assert(false, "catch");
}

function test_try_catch2()
{
    var a;
    try {
        a = 1;
    } catch (e) {
        a = 2;
    }
    assert(a, 1, "catch");
}

function test_try_catch3()
{
    var s;
    s = "";
    try {
        s += "t";
    } catch (e) {
        s += "c";
    } finally {
        s += "f";
    }
    assert(s, "tf", "catch");
}

function test_try_catch4()
{
    var s;
    s = "";
    try {
        s += "t";
        throw "c";
    } catch (e) {
        s += e;
    } finally {
        s += "f";
    }
    assert(s, "tcf", "catch");
}

function test_try_catch5()
{
    var s;
    s = "";
    for(;;) {
        try {
            s += "t";
            break;
            s += "b";
        } finally {
            s += "f";
        }
    }
    assert(s, "tf", "catch");
}

function test_try_catch6()
{
    function f() {
        try {
            s += 't';
            return 1;
        } finally {
            s += "f";
        }
    }
    var s = "";
    assert(f() === 1);
    assert(s, "tf", "catch6");
}

function test_try_catch7()
{
    var s;
    s = "";

    try {
        try {
            s += "t";
            throw "a";
        } finally {
            s += "f";
        }
    } catch(e) {
        s += e;
    } finally {
        s += "g";
    }
    assert(s, "tfag", "catch");
}

function test_try_catch8()
{
    var i, s;
    
    s = "";
    for(var i in {x:1, y:2}) {
        try {
            s += i;
            throw "a";
        } catch (e) {
            s += e;
        } finally {
            s += "f";
        }
    }
    assert(s === "xafyaf");
}
"#;

/// Loads `suite` and calls its function `name`.
fn run_suite_fn(suite: &str, name: &str) -> Result<(), EngineError> {
    let mut interp = Interpreter::new();
    interp.eval_source(&format!("{suite}\n{name}();")).map(|_| ())
}

fn check(suite: &str, name: &str) {
    if let Err(e) = run_suite_fn(suite, name) {
        panic!("{name}: {e}");
    }
}

#[test]
fn language_op1() {
    check(LANGUAGE_SUITE, "test_op1");
}

#[test]
fn language_cvt() {
    check(LANGUAGE_SUITE, "test_cvt");
}

#[test]
fn language_inc_dec() {
    check(LANGUAGE_SUITE, "test_inc_dec");
}

#[test]
fn language_op2() {
    check(LANGUAGE_SUITE, "test_op2");
}

#[test]
fn language_delete() {
    check(LANGUAGE_SUITE, "test_delete");
}

#[test]
fn language_object_literal() {
    check(LANGUAGE_SUITE, "test_object_literal");
}

#[test]
fn language_labels() {
    check(LANGUAGE_SUITE, "test_labels");
}

#[test]
fn language_argument_scope() {
    check(LANGUAGE_SUITE, "test_argument_scope");
}

#[test]
fn language_function_expr_name() {
    check(LANGUAGE_SUITE, "test_function_expr_name");
}

/// `test_arguments` compares against an `f` it never declares, so it ends in
/// a ReferenceError once its own assertions have passed.
#[test]
fn language_arguments() {
    let mut interp = Interpreter::new();
    match interp.eval_source(&format!("{LANGUAGE_SUITE}\ntest_arguments();")) {
        Err(EngineError::Uncaught { value, rendered }) => {
            assert!(interp.is_instance_of_global(&value, "ReferenceError"), "{rendered}");
            assert_eq!(rendered, "ReferenceError: f is not defined");
        }
        other => panic!("expected ReferenceError, got {other:?}"),
    }
}

#[test]
fn language_function_length_is_never_defined() {
    let mut interp = Interpreter::new();
    let err = interp
        .eval_source(&format!("{LANGUAGE_SUITE}\ntest_function_length();"))
        .unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert_eq!(err.to_string(), "Uncaught ReferenceError: test_function_length is not defined");
}

#[test]
fn loop_while() {
    check(LOOP_SUITE, "test_while");
}

#[test]
fn loop_while_break() {
    check(LOOP_SUITE, "test_while_break");
}

#[test]
fn loop_do_while() {
    check(LOOP_SUITE, "test_do_while");
}

#[test]
fn loop_for() {
    check(LOOP_SUITE, "test_for");
}

#[test]
fn loop_for_in() {
    check(LOOP_SUITE, "test_for_in");
}

#[test]
fn loop_for_in2() {
    check(LOOP_SUITE, "test_for_in2");
}

#[test]
fn loop_for_break() {
    check(LOOP_SUITE, "test_for_break");
}

#[test]
fn loop_switch1() {
    check(LOOP_SUITE, "test_switch1");
}

#[test]
fn loop_switch2() {
    check(LOOP_SUITE, "test_switch2");
}

#[test]
fn loop_try_catch1() {
    check(LOOP_SUITE, "test_try_catch1");
}

#[test]
fn loop_try_catch2() {
    check(LOOP_SUITE, "test_try_catch2");
}

#[test]
fn loop_try_catch3() {
    check(LOOP_SUITE, "test_try_catch3");
}

#[test]
fn loop_try_catch4() {
    check(LOOP_SUITE, "test_try_catch4");
}

#[test]
fn loop_try_catch5() {
    check(LOOP_SUITE, "test_try_catch5");
}

#[test]
fn loop_try_catch6() {
    check(LOOP_SUITE, "test_try_catch6");
}

#[test]
fn loop_try_catch7() {
    check(LOOP_SUITE, "test_try_catch7");
}

#[test]
fn loop_try_catch8() {
    check(LOOP_SUITE, "test_try_catch8");
}

#[test]
fn loop_suite_runs_in_order() {
    let calls: String = [
        "test_while", "test_while_break", "test_do_while", "test_for", "test_for_break",
        "test_switch1", "test_switch2", "test_for_in", "test_for_in2", "test_try_catch1",
        "test_try_catch2", "test_try_catch3", "test_try_catch4", "test_try_catch5",
        "test_try_catch6", "test_try_catch7", "test_try_catch8",
    ]
    .iter()
    .map(|f| format!("{f}();\n"))
    .collect();
    let mut interp = Interpreter::new();
    if let Err(e) = interp.eval_source(&format!("{LOOP_SUITE}\n{calls}")) {
        panic!("{e}");
    }
}
