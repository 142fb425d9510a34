use amba_transpiler::{Options, Pipeline, WithLowering};

fn compile(source: &str) -> String {
    let pipeline = Pipeline::standard();
    pipeline.compile(source, &Options::default()).unwrap().code
}

fn compile_with(source: &str, options: Options) -> String {
    Pipeline::standard().compile(source, &options).unwrap().code
}

#[test]
fn test_binary_operator_table() {
    for op in ["+", "-", "*", "/", "%", "**", "==", "!=", "<", "<=", ">", ">="] {
        let output = compile(&format!("r = a {} b\n", op));
        assert_eq!(output, format!("let r = (a {} b);\n", op));
    }
}

#[test]
fn test_nested_operands_are_translated() {
    assert_eq!(compile("r = (a + 1) * f(b)\n"), "let r = ((a + 1) * f(b));\n");
    assert_eq!(compile("r = not a or b\n"), "let r = (!a || b);\n");
}

#[test]
fn test_assignment() {
    assert_eq!(compile("x = 1 + 2\n"), "let x = (1 + 2);\n");
}

#[test]
fn test_range_loops() {
    assert_eq!(
        compile("for i in range(10):\n    print(i)\n"),
        "for (let i = 0; i < 10; i++) {\n  console.log(i);\n}\n"
    );
    assert_eq!(
        compile("for i in range(2, n):\n    print(i)\n"),
        "for (let i = 2; i < n; i++) {\n  console.log(i);\n}\n"
    );
    assert_eq!(
        compile("for i in range(0, 10, 2):\n    print(i)\n"),
        "for (let i = 0; i < 10; i += 2) {\n  console.log(i);\n}\n"
    );
}

#[test]
fn test_mapping_loops() {
    let output = compile("for k, v in d.items():\n    print(k)\n    print(v)\n");
    assert_eq!(
        output,
        "for (let [k, v] of Object.entries(d)) {\n  console.log(k);\n  console.log(v);\n}\n"
    );

    assert_eq!(
        compile("for k in d.keys():\n    pass\n"),
        "for (let k of Object.keys(d)) {\n}\n"
    );
    assert_eq!(
        compile("for v in config.values():\n    total += v\n"),
        "for (let v of Object.values(config)) {\n  total += v;\n}\n"
    );
}

#[test]
fn test_generic_and_async_loops() {
    assert_eq!(
        compile("for item in items:\n    handle(item)\n"),
        "for (let item of items) {\n  handle(item);\n}\n"
    );
    assert_eq!(
        compile("async def main():\n    async for msg in stream:\n        print(msg)\n"),
        "async function main() {\n  for await (let msg of stream) {\n    console.log(msg);\n  }\n}\n"
    );
}

#[test]
fn test_zip_loop() {
    let output = compile("for name, age in zip(names, ages):\n    print(name, age)\n");
    assert_eq!(
        output,
        "let name;\n\
         let age;\n\
         for (let i = 0; i < names.length; i++) {\n\
         \x20 name = names[i];\n\
         \x20 age = ages[i];\n\
         \x20 console.log(name, age);\n\
         }\n"
    );
}

#[test]
fn test_fstring() {
    assert_eq!(
        compile("print(f'The sum is {total}')\n"),
        "console.log(`The sum is ${total}`);\n"
    );
}

#[test]
fn test_conditional_translates_full_branches() {
    let output = compile("if x > 0:\n    a = 1\n    b = 2\nelse:\n    a = 3\n    b = 4\n");
    assert_eq!(
        output,
        "if ((x > 0)) {\n  let a = 1;\n  let b = 2;\n} else {\n  let a = 3;\n  let b = 4;\n}\n"
    );
}

#[test]
fn test_elif_nests_inside_else() {
    let output = compile("if n == 0:\n    return 0\nelif n == 1:\n    return 1\nelse:\n    return n\n");
    assert_eq!(
        output,
        "if ((n == 0)) {\n  return 0;\n} else {\n  if ((n == 1)) {\n    return 1;\n  } else {\n    return n;\n  }\n}\n"
    );
}

#[test]
fn test_while_else_keeps_shape() {
    assert_eq!(
        compile("while n > 0:\n    n -= 1\nelse:\n    done()\n"),
        "while ((n > 0)) {\n  n -= 1;\n} else {\n  done();\n}\n"
    );
}

#[test]
fn test_function_definitions() {
    assert_eq!(
        compile("def add(a, b):\n    return a + b\n"),
        "function add(a, b) {\n  return (a + b);\n}\n"
    );
    assert_eq!(
        compile("async def load(url):\n    data = await fetch(url)\n    return data\n"),
        "async function load(url) {\n  let data = await fetch(url);\n  return data;\n}\n"
    );
}

#[test]
fn test_early_exits() {
    let output = compile("def f(xs):\n    for x in xs:\n        if x:\n            break\n        continue\n    return\n");
    assert!(output.contains("      break;\n"));
    assert!(output.contains("    continue;\n"));
    assert!(output.contains("  return;\n"));
}

#[test]
fn test_raise() {
    assert_eq!(compile("raise ValueError('bad')\n"), "throw ValueError('bad');\n");
    assert_eq!(
        compile("try:\n    f()\nexcept:\n    raise\n"),
        "try {\n  f();\n} catch (_error) {\n  throw new Error();\n}\n"
    );
}

#[test]
fn test_try_single_handler() {
    assert_eq!(
        compile("try:\n    risky()\nexcept ValueError as err:\n    print(err)\nfinally:\n    cleanup()\n"),
        "try {\n  risky();\n} catch (err) {\n  console.log(err);\n} finally {\n  cleanup();\n}\n"
    );
}

#[test]
fn test_try_multiple_handlers_dispatch() {
    let source = "try:\n    risky()\nexcept KeyError as e:\n    print(e)\nexcept (TypeError, ValueError):\n    print(2)\n";
    assert_eq!(
        compile(source),
        "try {\n\
         \x20 risky();\n\
         } catch (_error) {\n\
         \x20 if (_error instanceof KeyError) {\n\
         \x20   let e = _error;\n\
         \x20   console.log(e);\n\
         \x20 } else if (_error instanceof TypeError || _error instanceof ValueError) {\n\
         \x20   console.log(2);\n\
         \x20 } else {\n\
         \x20   throw _error;\n\
         \x20 }\n\
         }\n"
    );
}

#[test]
fn test_try_multiple_handlers_with_fallback() {
    let source = "try:\n    risky()\nexcept KeyError:\n    a()\nexcept:\n    b()\n";
    let output = compile(source);
    assert!(output.contains("  } else {\n    b();\n  }\n"));
    assert!(!output.contains("throw _error;"));
}

#[test]
fn test_try_finally_only() {
    assert_eq!(
        compile("try:\n    work()\nfinally:\n    done()\n"),
        "try {\n  work();\n} finally {\n  done();\n}\n"
    );
}

#[test]
fn test_with_pseudo_block() {
    assert_eq!(
        compile("with open(path) as f:\n    print(f.read())\n"),
        "with ({\n  open(path): f,\n}) {\n  console.log(f.read());\n}\n"
    );
    assert_eq!(
        compile("with lock:\n    pass\n"),
        "with ({\n  lock: null,\n}) {\n}\n"
    );
}

#[test]
fn test_async_with_using() {
    let options = Options { with_lowering: WithLowering::Using, ..Options::default() };
    assert_eq!(
        compile_with("async def f():\n    async with session() as s:\n        await s.get()\n", options),
        "async function f() {\n  {\n    await using s = session();\n    await s.get();\n  }\n}\n"
    );
}

#[test]
fn test_imports() {
    assert_eq!(compile("import os\n"), "const os = require(\"os\");\n");
    assert_eq!(compile("import os.path\n"), "const os = require(\"os.path\");\n");
    assert_eq!(compile("import numpy as np\n"), "const np = require(\"numpy\");\n");
    assert_eq!(
        compile("from lib.util import helper, other as o\n"),
        "const helper = require(\"lib.util.helper\");\nconst o = require(\"lib.util.other\");\n"
    );
}

#[test]
fn test_comprehensions() {
    assert_eq!(compile("evens = [n for n in nums if n % 2 == 0]\n"), "let evens = nums.filter((n) => ((n % 2) == 0)).map((n) => n);\n");
    assert_eq!(compile("total = sum(x * x for x in xs)\n"), "let total = sum(xs.map((x) => (x * x)));\n");
}

#[test]
fn test_starred_and_containers() {
    assert_eq!(compile("merged = [*a, *b]\n"), "let merged = [...a, ...b];\n");
    assert_eq!(compile("point = {'x': 1, 'y': 2}\n"), "let point = {'x': 1, 'y': 2};\n");
    assert_eq!(compile("pair = (1, 2)\n"), "let pair = (1, 2);\n");
}

#[test]
fn test_print_with_several_arguments() {
    assert_eq!(compile("print('a', 1, x)\n"), "console.log('a', 1, x);\n");
}

#[test]
fn test_pass_emits_nothing() {
    assert_eq!(compile("def noop():\n    pass\n"), "function noop() {\n}\n");
}

#[test]
fn test_indent_option() {
    let options = Options { indent: "\t".to_string(), ..Options::default() };
    assert_eq!(compile_with("if a:\n    b()\n", options), "if (a) {\n\tb();\n}\n");
}

#[test]
fn test_empty_source() {
    assert_eq!(compile(""), "");
    assert_eq!(compile("# only a comment\n"), "");
}

#[test]
fn test_each_run_starts_from_zero() {
    let pipeline = Pipeline::standard();
    let first = pipeline.compile("def f():\n    return 1\n", &Options::default()).unwrap();
    let second = pipeline.compile("x = 1\n", &Options::default()).unwrap();
    assert_eq!(first.code, "function f() {\n  return 1;\n}\n");
    assert_eq!(second.code, "let x = 1;\n");
}
