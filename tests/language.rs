use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fs,
    io::{self, Cursor, Read, Write},
    rc::Rc,
};

use plume::{
    error::{Error, ParseError, RuntimeError},
    interpreter::{
        context::{Context, shared::Io},
        executor::core::Executable,
        plugin::{
            ObjectHandle, ObjectModule, Returned,
            descriptor::{ABI_VERSION, ArgDecl, MethodDecl, ModuleDescriptor},
            registry::PluginRegistry,
        },
        value::core::Value,
    },
    options::{IncludeResolver, Options},
    run_source,
};
use walkdir::WalkDir;

#[derive(Clone, Default)]
struct Sink(Rc<RefCell<Vec<u8>>>);

impl Sink {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Harness {
    ctx:         Context,
    output:      Sink,
    diagnostics: Sink,
}

impl Harness {
    fn with(options: Options, registry: PluginRegistry, input: &str) -> Self {
        let output = Sink::default();
        let diagnostics = Sink::default();
        let io = Io { output:      Box::new(output.clone()),
                      diagnostics: Box::new(diagnostics.clone()),
                      input:       Box::new(Cursor::new(input.as_bytes().to_vec())), };
        let ctx = Context::new(options, Rc::new(RefCell::new(registry)), io);
        Self { ctx,
               output,
               diagnostics }
    }

    fn new() -> Self {
        Self::with(Options::default(), PluginRegistry::new(), "")
    }

    fn run(&mut self, src: &str) -> Result<(), Error> {
        run_source(&mut self.ctx, src)
    }
}

fn assert_success(src: &str) {
    if let Err(e) = Harness::new().run(src) {
        panic!("Script failed: {e}\n{src}");
    }
}

fn assert_failure(src: &str) {
    if Harness::new().run(src).is_ok() {
        panic!("Script succeeded but was expected to fail:\n{src}")
    }
}

fn runtime_error(src: &str) -> RuntimeError {
    match Harness::new().run(src) {
        Err(Error::Runtime(e)) => e,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

fn parse_error(src: &str) -> ParseError {
    match Harness::new().run(src) {
        Err(Error::Parse(e)) => e,
        other => panic!("expected a parse error, got {other:?}"),
    }
}

fn output_of(src: &str) -> String {
    let mut harness = Harness::new();
    if let Err(e) = harness.run(src) {
        panic!("Script failed: {e}\n{src}");
    }
    harness.output.text()
}

#[test]
fn script_files_run() {
    let mut count = 0;

    for entry in WalkDir::new("tests/scripts").into_iter()
                                               .filter_map(Result::ok)
                                               .filter(|e| e.path().extension().is_some_and(|ext| ext == "plm"))
    {
        let path = entry.path();
        let content = fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));
        count += 1;
        if let Err(e) = Harness::new().run(&content) {
            panic!("Script {path:?} failed: {e}");
        }
    }

    assert!(count > 0, "No scripts found in tests/scripts");
}

#[test]
fn assignment_and_basic_arithmetic() {
    assert_success("let x = 1 + 2; assert(x == 3);");
    assert_success("let x = 7 * 9; assert(x == 63);");
    assert_success("let x = 8 - 5; assert(x == 3);");
    assert_success("let x = 7 / 2; assert(x == 3);");
    assert_success("let x = 7 % 3; assert(x == 1);");
    assert_success("let x = 2 ** 10; assert(x == 1024);");
    assert_success("let x = 1.5 + 1; assert(x == 2.5);");
}

#[test]
fn integer_errors_are_named() {
    assert_eq!(runtime_error("let x = 1 / 0;").name(), Some("divide_by_zero"));
    assert_eq!(runtime_error("let x = 9223372036854775807 + 1;").name(), Some("overflow"));
    assert_eq!(runtime_error("let x = 2 ** (0 - 1);").name(), Some("invalid_argument"));
}

#[test]
fn comparisons_and_logic() {
    assert_success("assert(2 < 3); assert(3 >= 3); assert(2 != 3);");
    assert_success("assert(not false); assert(true and true); assert(false or true);");
    assert_success("assert(true xor false);");
    assert_success(r#"assert("hello" matches "l+");"#);
    assert_success(r#"assert(not ("abc" matches "^b"));"#);
}

#[test]
fn null_compares_only_by_equality() {
    assert_success("let x integer; assert(isnull(x)); assert(x == null);");
    assert_eq!(runtime_error("let x integer; let y = x + 1;").name(), Some("null_value"));
}

#[test]
fn chained_relational_operators_are_rejected() {
    assert!(matches!(parse_error("assert(1 < 2 < 3);"), ParseError::ChainedRelational { .. }));
}

#[test]
fn if_and_while() {
    assert_success(
                   r"
        let x = 5;
        let kind = 0;
        if x < 3 then
            kind = 1;
        elsif x < 10 then
            kind = 2;
        else
            kind = 3;
        end if;
        assert(kind == 2);
    ",
    );
    assert_success("let n = 0; while n < 10 loop n = n + 1; end loop; assert(n == 10);");
}

#[test]
fn for_loops() {
    assert_success("let s = 0; for i in 1 to 10 loop s = s + i; end loop; assert(s == 55); assert(i == 10);");
    assert_success("let s = 0; for i in 10 to 1 desc loop s = s + i; end loop; assert(s == 55); assert(i == 1);");
    assert_success("let s = 0; for i in 0 to 10 step 5 loop s = s + i; end loop; assert(s == 15);");
    assert_success("for i in 1 to 10 loop i = i * 2; end loop; assert(i == 14);");
    assert_success("let s = 0; for i in 5 to 1 loop s = s + 1; end loop; assert(s == 0); assert(i == 5);");
    assert_eq!(runtime_error("for i in 1 to 3 step 0 loop end loop;").name(), Some("invalid_argument"));
}

#[test]
fn break_and_continue() {
    assert_success(
                   r"
        let s = 0;
        for i in 1 to 10 loop
            if i == 3 then continue; end if;
            if i == 6 then break; end if;
            s = s + i;
        end loop;
        assert(s == 12);
    ",
    );
    assert_success("break; continue; let x = 1; assert(x == 1);");
}

#[test]
fn forall_writes_through_to_the_collection() {
    assert_success(
                   r"
        let a = tab(1, 2, 3);
        forall v in a loop
            v = v * 10;
        end loop;
        assert(a@0 == 10);
        assert(a@2 == 30);
        assert(v == 30);
    ",
    );
    assert_success("let a integer[]; let n = 0; forall v in a loop n = n + 1; end loop; assert(n == 0);");
}

#[test]
fn forall_collection_cannot_be_mutated() {
    assert!(matches!(parse_error("let a = tab(1, 2); forall v in a loop a.concat(3); end loop;"),
                     ParseError::ForbiddenMutation { .. }));
    assert!(matches!(parse_error("let a = tab(1, 2); forall v in a loop a = tab(5); end loop;"),
                     ParseError::ForbiddenMutation { .. }));
}

#[test]
fn collections_and_methods() {
    assert_success("let a = tab(1, 2, 3); assert(a.count() == 3); assert(a@1 == 2);");
    assert_success("let a = tab(1, 2); a.concat(3); assert(a.count() == 3); assert(a@2 == 3);");
    assert_success("let a = tab(1, 2); a.concat(tab(3, 4)); assert(a.count() == 4);");
    assert_success("let a = tab(1, 3); a.insert(1, 2); assert(a@1 == 2); a.delete(0); assert(a@0 == 2);");
    assert_success("let a = tab(1, 2); a.put(0, 9); assert(a@0 == 9);");
    assert_success(r#"let a = tab(1, 2, 3); assert(typeof(a) == "integer[]");"#);
    assert_eq!(runtime_error("let a = tab(1, 2); let x = a@5;").name(), Some("out_of_range"));
}

#[test]
fn strings_and_bytes() {
    assert_success(r#"let s = "Hello"; assert(s.upper() == "HELLO"); assert(s.lower() == "hello");"#);
    assert_success(r#"let s = "Hello"; assert(s@1 == "e"); assert(s.count() == 5);"#);
    assert_success(r#"let s = "ab" + "cd"; assert(s == "abcd");"#);
    assert_success(r#"let b = bytes("AB"); assert(b@0 == 65); assert(b.count() == 2);"#);
}

#[test]
fn tuples_are_one_based() {
    assert_success(r#"let t = tup(7, "x"); assert(t@1 == 7); assert(t@2 == "x");"#);
    assert_success(r#"let a = tup(1, "x"); let b = tup(2, "y"); assert(typeof(a) == typeof(b));"#);
    assert_success(r#"let a = tup(1, "x"); let b = tup("x", 1); assert(typeof(a) != typeof(b));"#);
}

#[test]
fn imaginary_numbers() {
    assert_success("let z = imag(1, 2) * imag(1, 2); assert(z.re() == 0 - 3); assert(z.im() == 4);");
    assert_success("let z = imag(3, 4); assert(abs(z) == 5);");
}

#[test]
fn functions_and_recursion() {
    assert_success(
                   r"
        function fact(n integer) return integer is
        begin
            if n <= 1 then
                return 1;
            end if;
            return n * fact(n - 1);
        end;
        assert(fact(10) == 3628800);
    ",
    );
    assert_success(
                   r"
        let total = 0;
        function bump(by integer) is
        begin
            return;
        end;
        bump(3);
        assert(total == 0);
    ",
    );
}

#[test]
fn recursion_limit_is_enforced() {
    let options = Options::default().with_recursion_limit(16);
    let mut harness = Harness::with(options, PluginRegistry::new(), "");
    let result = harness.run(
                             r"
        function down(n integer) return integer is
        begin
            return down(n + 1);
        end;
        let x = down(0);
    ",
    );
    match result {
        Err(Error::Runtime(e)) => assert_eq!(e.name(), Some("recursion_limit")),
        other => panic!("expected recursion_limit, got {other:?}"),
    }
}

#[test]
fn default_recursion_limit_fails_cleanly() {
    let mut harness = Harness::new();
    let result = harness.run(
                             r"
        function down(n integer) return integer is
        begin
            return down(n + 1);
        end;
        let x = down(0);
    ",
    );
    match result {
        Err(Error::Runtime(e)) => assert_eq!(e.name(), Some("recursion_limit")),
        other => panic!("expected recursion_limit, got {other:?}"),
    }
    assert_eq!(harness.ctx.shared().depth(), 0);

    assert_success(
                   r"
        function sum(n integer) return integer is
        begin
            if n == 0 then
                return 0;
            end if;
            return n + sum(n - 1);
        end;
        assert(sum(250) == 31375);
    ",
    );
}

#[test]
fn deep_nesting_is_a_parse_error() {
    let deep = format!("let x = {}1{};", "(".repeat(3000), ")".repeat(3000));
    assert!(matches!(parse_error(&deep), ParseError::NestingTooDeep { .. }));

    let negations = format!("let x = {}1;", "- ".repeat(3000));
    assert!(matches!(parse_error(&negations), ParseError::NestingTooDeep { .. }));

    let blocks = format!("{}let x = 1;{}", "if true then ".repeat(3000), " end if;".repeat(3000));
    assert!(matches!(parse_error(&blocks), ParseError::NestingTooDeep { .. }));

    let moderate = format!("let x = {}1{}; assert(x == 1);", "(".repeat(100), ")".repeat(100));
    assert_success(&moderate);
}

#[test]
fn failed_redeclaration_keeps_the_previous_function() {
    let mut harness = Harness::new();
    assert!(harness.run("function f() return integer is begin return 1; end;").is_ok());
    assert!(harness.run(r#"function f() return integer is begin return "x"; end;"#).is_err());
    assert!(harness.run("print f();").is_ok());
    assert_eq!(harness.output.text(), "1\n");
}

#[test]
fn functions_declared_in_a_failed_statement_are_withdrawn() {
    let mut harness = Harness::new();
    assert!(harness.run("if true then function g() return integer is begin return 1; end; let y = 1 +; end if;")
                   .is_err());
    assert!(matches!(harness.run("let z = g();"),
                     Err(Error::Parse(ParseError::UnknownSymbol { .. }))));
    assert!(harness.run("function g() return integer is begin return 2; end; assert(g() == 2);")
                   .is_ok());
}

#[test]
fn large_integers_widen_to_decimal() {
    assert_success("let d decimal = 9007199254740993; assert(d > 9007199254740000.0);");
    assert_success("let y = 9007199254740993 + 0.5; assert(y > 9007199254740000.0);");
    assert_success("let y = 0.5 * 9223372036854775807; assert(y > 0.0);");
}

#[test]
fn escaping_errors_unwind_loops_and_calls() {
    let mut harness = Harness::new();
    let result = harness.run(
                             r"
        function boom(n integer) return integer is
        begin
            return n / 0;
        end;
        let a = tab(1, 2);
        for i in 1 to 3 loop
            while true loop
                forall v in a loop
                    let q = boom(v);
                end loop;
            end loop;
        end loop;
    ",
    );
    match result {
        Err(Error::Runtime(e)) => assert_eq!(e.name(), Some("divide_by_zero")),
        other => panic!("expected divide_by_zero, got {other:?}"),
    }
    assert_eq!(harness.ctx.control_depth(), 0);
    assert_eq!(harness.ctx.exec_depth(), 0);
    assert_eq!(harness.ctx.shared().depth(), 0);
    assert_eq!(harness.ctx.temporaries(), 0);

    assert!(harness.run(r#"i = "s"; assert(i == "s");"#).is_ok());
}

#[test]
fn call_environments_are_reused() {
    let mut harness = Harness::new();
    assert!(harness.run(
                        r"
        function fact(n integer) return integer is
        begin
            if n <= 1 then
                return 1;
            end if;
            return n * fact(n - 1);
        end;
        let a = fact(5);
    ",
    )
                   .is_ok());
    let Some(fact) = harness.ctx.functors().lookup("fact") else {
        panic!("fact is not declared");
    };
    let pooled = fact.pooled();
    assert_eq!(pooled, 5);

    for _ in 0..10 {
        assert!(harness.run("a = fact(5); a = fact(3);").is_ok());
        assert_eq!(fact.pooled(), pooled);
    }
}

#[test]
fn return_value_type_is_checked() {
    assert!(matches!(parse_error("function f() is begin return 1; end;"),
                     ParseError::InvalidReturn { .. }));
    assert!(matches!(parse_error("return 1;"), ParseError::InvalidReturn { .. }));
}

#[test]
fn exception_handlers() {
    assert_eq!(output_of(
                         r"
        begin
            let x = 1 / 0;
        exception
            when overflow then
                print 1;
            when divide_by_zero then
                print error();
            when others then
                print 3;
        end;
    ",
    ),
               "divide_by_zero\n");
    assert_eq!(output_of("begin raise Oops; exception when others then print error(); end;"),
               "oops\n");
    assert_success("begin assert(false); exception when assertion_failed then let handled = true; end;");
}

#[test]
fn unhandled_errors_propagate() {
    assert_eq!(runtime_error("begin let x = 1 / 0; exception when overflow then let y = 1; end;").name(),
               Some("divide_by_zero"));
    assert_eq!(runtime_error(
                             r"
        begin
            raise inner;
        exception
            when inner then
                raise outer;
        end;
    ",
    ).name(),
               Some("outer"));
}

#[test]
fn safety_variables_keep_their_type() {
    assert_success("let $x = 1; $x = 2; assert($x == 2);");
    assert!(matches!(parse_error(r#"let $x = 1; $x = "text";"#), ParseError::TypeMismatch { .. }));
    assert_success(r#"let x = 1; x = "text"; assert(x == "text");"#);
}

#[test]
fn failed_statements_are_rolled_back() {
    let mut harness = Harness::new();
    assert!(harness.run("for fresh in 1 to 2 loop let inner = 1 +; end loop;").is_err());
    assert!(matches!(harness.run("assert(fresh == 1);"),
                     Err(Error::Parse(ParseError::UnknownSymbol { .. }))));
    assert!(harness.run("let fresh = 2; assert(fresh == 2);").is_ok());
}

#[test]
fn unknown_names_are_parse_errors() {
    assert!(matches!(parse_error("let z = y + 1;"), ParseError::UnknownSymbol { .. }));
    assert_failure("let x = nosuch(1);");
}

#[test]
fn print_and_put_write_to_output() {
    assert_eq!(output_of(r#"put "a"; put 1; print "b", 2;"#), "a1b2\n");
    assert_eq!(output_of("print tab(1, 2);"), "[1, 2]\n");
}

#[test]
fn readln_reads_the_input() {
    let mut harness = Harness::with(Options::default(), PluginRegistry::new(), "hello\n");
    harness.run("let l = readln(); print l.upper(); assert(isnull(readln()));")
           .unwrap();
    assert_eq!(harness.output.text(), "HELLO\n");
}

#[test]
fn trace_writes_diagnostics() {
    let mut harness = Harness::new();
    harness.run("trace on;\nlet x = 1;\ntrace off;\nlet y = 2;").unwrap();
    let trace = harness.diagnostics.text();
    assert!(trace.contains("[2]"), "{trace}");
    assert!(!trace.contains("[4]"), "{trace}");
}

#[test]
fn unparse_reproduces_statements() {
    let mut ctx = Harness::new().ctx;
    let program = Executable::from_source(&mut ctx, "let a = (1 + 2) * 3; print a;").unwrap();
    let text = program.unparse();
    assert!(text.contains("(1 + 2) * 3"), "{text}");

    let mut again = Harness::new();
    again.run(&text).unwrap();
    again.run("assert(a == 9);").unwrap();
    assert_eq!(again.output.text(), "9\n");
}

struct Sources(HashMap<&'static str, &'static str>);

impl IncludeResolver for Sources {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read>> {
        self.0
            .get(path)
            .map(|src| Box::new(Cursor::new(src.as_bytes().to_vec())) as Box<dyn Read>)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

#[test]
fn includes_need_trust() {
    assert!(matches!(parse_error(r#"include "lib.plm";"#), ParseError::UntrustedInclude { .. }));

    let sources = Sources(HashMap::from([("lib.plm", "let shared_value = 40;"),
                                         ("self.plm", r#"include "self.plm";"#)]));
    let options = Options::default().with_includes(Rc::new(sources));
    let mut harness = Harness::with(options, PluginRegistry::new(), "");
    harness.run(r#"include "lib.plm"; assert(shared_value + 2 == 42);"#)
           .unwrap();
    assert!(matches!(harness.run(r#"include "self.plm";"#),
                     Err(Error::Parse(ParseError::IncludeTooDeep { .. }))));
    assert!(matches!(harness.run(r#"include "missing.plm";"#),
                     Err(Error::Parse(ParseError::IncludeFailed { .. }))));
}

struct Counter {
    descriptor: ModuleDescriptor,
    counts:     RefCell<HashMap<ObjectHandle, i64>>,
    next:       Cell<ObjectHandle>,
    destroyed:  Rc<Cell<usize>>,
}

impl Counter {
    fn new(destroyed: Rc<Cell<usize>>) -> Self {
        let int = ArgDecl::scalar("I");
        let descriptor = ModuleDescriptor { version:   ABI_VERSION,
                                            type_name: "Counter",
                                            ctors:     vec![MethodDecl { id:   0,
                                                                         name: "counter",
                                                                         args: vec![],
                                                                         ret:  None, }],
                                            methods:   vec![MethodDecl { id:   0,
                                                                         name: "inc",
                                                                         args: vec![],
                                                                         ret:  Some(int), },
                                                            MethodDecl { id:   1,
                                                                         name: "add",
                                                                         args: vec![int],
                                                                         ret:  Some(int), },
                                                            MethodDecl { id:   2,
                                                                         name: "fail",
                                                                         args: vec![],
                                                                         ret:  None, }], };
        Self { descriptor,
               counts: RefCell::new(HashMap::new()),
               next: Cell::new(1),
               destroyed }
    }
}

impl ObjectModule for Counter {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn create_object(&self, _ctor: u32, _args: &[Value]) -> Result<ObjectHandle, String> {
        let handle = self.next.get();
        self.next.set(handle + 1);
        self.counts.borrow_mut().insert(handle, 0);
        Ok(handle)
    }

    fn execute_method(&self,
                      object: ObjectHandle,
                      method: u32,
                      args: &[Value])
                      -> Result<Returned, String> {
        let mut counts = self.counts.borrow_mut();
        let count = counts.get_mut(&object).ok_or("unknown counter")?;
        match method {
            0 => *count += 1,
            1 => {
                let by = args.first()
                             .and_then(|v| v.integer(0).ok().flatten())
                             .ok_or("add needs an integer")?;
                *count += by;
            },
            _ => return Err("counter failure".to_string()),
        }
        Ok(Returned::Value(Value::from(*count)))
    }

    fn destroy_object(&self, object: ObjectHandle) {
        self.counts.borrow_mut().remove(&object);
        self.destroyed.set(self.destroyed.get() + 1);
    }
}

#[test]
fn native_objects() {
    let destroyed = Rc::new(Cell::new(0));
    let mut registry = PluginRegistry::new();
    registry.provide("counter", Rc::new(Counter::new(Rc::clone(&destroyed))));
    let mut harness = Harness::with(Options::default(), registry, "");

    harness.run(
                r"
        import counter;
        let c = counter();
        c.inc();
        assert(c.add(5) == 6);
        let d = c;
        assert(d.inc() == 7);
        begin
            c.fail();
        exception
            when plugin_error then
                print error();
        end;
    ",
    )
           .unwrap();
    assert_eq!(harness.output.text(), "plugin_error\n");
    assert_eq!(destroyed.get(), 0);

    harness.ctx.purge();
    assert_eq!(destroyed.get(), 1);
}

#[test]
fn unknown_modules_fail_to_import() {
    assert!(matches!(parse_error("import nowhere;"), ParseError::ModuleNotFound { .. }));
}
