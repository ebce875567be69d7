//! Globals that test scripts use to check their own behaviour.

use crate::interpreter::{Completion, Interpreter, same_value, to_boolean};
use crate::types::JsValue;
use log::trace;

/// Registers `assert`, `assert_throws` and `println`.
pub fn install(interp: &mut Interpreter) {
    interp.register_global_fn("assert", 3, assert);
    interp.register_global_fn("assert_throws", 2, assert_throws);
    interp.register_global_fn("println", 0, println);
}

fn nth(args: &[JsValue], i: usize) -> JsValue {
    args.get(i).cloned().unwrap_or(JsValue::Undefined)
}

fn assert(interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Completion {
    let actual = nth(args, 0);
    // `assert(cond, "text")` passes a message, not an expected value.
    let message_form = args.len() == 2 && actual.is_boolean() && args[1].is_string();
    let (passed, expected, message) = if args.len() < 2 || message_form {
        (to_boolean(&actual), JsValue::Boolean(true), args.get(1))
    } else {
        (same_value(&actual, &args[1]), args[1].clone(), args.get(2))
    };
    trace!("assert: {}", if passed { "pass" } else { "FAIL" });
    if passed {
        return Completion::Normal(JsValue::Undefined);
    }
    let mut text = format!(
        "assertion failed: got |{}|, expected |{}|",
        interp.value_to_display(&actual),
        interp.value_to_display(&expected)
    );
    if let Some(m) = message {
        text.push_str(&format!(" ({})", interp.value_to_display(m)));
    }
    Completion::Throw(interp.create_error("Error", &text))
}

fn assert_throws(interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Completion {
    let ctor = nth(args, 0);
    let func = nth(args, 1);
    let rest = args.get(2..).unwrap_or(&[]);
    trace!("assert_throws: calling with {} arguments", rest.len());
    let failure = match interp.call_function(&func, &JsValue::Undefined, rest) {
        Completion::Throw(err) => match interp.instance_of(&err, &ctor) {
            Ok(true) => return Completion::Normal(JsValue::Undefined),
            Ok(false) => format!(
                "expected exception of the given type, got |{}|",
                interp.value_to_display(&err)
            ),
            Err(e) => return Completion::Throw(e),
        },
        _ => "expected exception, none was thrown".to_string(),
    };
    Completion::Throw(interp.create_error("Error", &failure))
}

fn println(interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Completion {
    let line = args
        .iter()
        .map(|a| interp.value_to_display(a))
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line}");
    Completion::Normal(JsValue::Undefined)
}
