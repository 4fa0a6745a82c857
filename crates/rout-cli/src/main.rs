use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

use rout_analyzer::SemanticAnalyzer;
use rout_codegen_wat::WatCodegen;
use rout_lexer::Lexer;
use rout_optimizer::Optimizer;
use rout_parser::Parser;

/// Run the whole pipeline on one source string: lex, parse, analyze,
/// optimize, generate. Returns the WAT module and the analyzer warnings.
fn compile_source(source: &str) -> Result<(String, Vec<String>), String> {
    let tokens = Lexer::new(source).tokenize();

    let program = Parser::new(tokens)
        .parse_program()
        .map_err(|e| e.to_string())?;

    let mut analyzer = SemanticAnalyzer::new();
    analyzer.analyze(&program).map_err(|e| e.to_string())?;
    let warnings = analyzer.warnings().to_vec();

    let mut optimizer = Optimizer::new();
    let program = optimizer.optimize(program);

    let mut codegen = WatCodegen::new(analyzer.context());
    let wat = codegen.generate(&program).map_err(|e| e.to_string())?;

    Ok((wat, warnings))
}

fn compile_file(source_path: &str) -> Result<(String, Vec<String>), String> {
    let source = fs::read_to_string(source_path)
        .map_err(|e| format!("Error reading file '{}': {}", source_path, e))?;
    compile_source(&source)
}

fn cmd_compile(source_path: &str, output_dir: &str) {
    let (wat, warnings) = match compile_file(source_path) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    if let Err(e) = fs::create_dir_all(output_dir) {
        eprintln!("Error creating output directory '{}': {}", output_dir, e);
        std::process::exit(1);
    }

    let stem = Path::new(source_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("out");
    let wat_path = Path::new(output_dir).join(format!("{stem}.wat"));
    let wasm_path = Path::new(output_dir).join(format!("{stem}.wasm"));

    if let Err(e) = fs::write(&wat_path, &wat) {
        eprintln!("Error writing '{}': {}", wat_path.display(), e);
        std::process::exit(1);
    }
    println!("Generated: {}", wat_path.display());

    // Binary conversion is delegated to the external wat2wasm tool
    match Command::new("wat2wasm")
        .arg(&wat_path)
        .arg("-o")
        .arg(&wasm_path)
        .output()
    {
        Ok(output) => {
            for line in String::from_utf8_lossy(&output.stderr).lines() {
                eprintln!("wat2wasm: {}", line);
            }
            if output.status.success() {
                println!("Generated: {}", wasm_path.display());
            } else {
                eprintln!("wat2wasm failed with status: {}", output.status);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error running wat2wasm: {}", e);
            eprintln!("Make sure wat2wasm is installed and in PATH");
            std::process::exit(1);
        }
    }
}

fn cmd_run(source_path: &str) {
    let (wat, warnings) = match compile_file(source_path) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    if let Err(e) = execute_wat(&wat) {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

/// Instantiate the generated module under wasmtime (which accepts WAT text
/// directly) with the five print imports implemented on the host, then call
/// the exported `main`.
fn execute_wat(wat: &str) -> Result<(), String> {
    use std::io::Write;
    use wasmtime::*;

    let engine = Engine::default();
    let module =
        Module::new(&engine, wat).map_err(|e| format!("Failed to load module: {}", e))?;

    let mut store: Store<()> = Store::new(&engine, ());
    let mut linker: Linker<()> = Linker::new(&engine);

    linker
        .func_wrap("env", "printInt", |value: i32| {
            print!("{}", value);
        })
        .map_err(|e| format!("Failed to register env.printInt: {}", e))?;

    linker
        .func_wrap("env", "printFloat", |value: f64| {
            print!("{}", value);
        })
        .map_err(|e| format!("Failed to register env.printFloat: {}", e))?;

    linker
        .func_wrap("env", "printBool", |value: i32| {
            print!("{}", if value != 0 { "true" } else { "false" });
        })
        .map_err(|e| format!("Failed to register env.printBool: {}", e))?;

    // The pointer addresses a NUL-terminated UTF-8 string in the module's
    // exported memory
    linker
        .func_wrap("env", "printString", |mut caller: Caller<'_, ()>, ptr: i32| {
            let memory = caller
                .get_export("memory")
                .and_then(|e| e.into_memory())
                .expect("missing memory export");
            let data = memory.data(&caller);
            let start = (ptr as usize).min(data.len());
            let end = data[start..]
                .iter()
                .position(|&b| b == 0)
                .map(|n| start + n)
                .unwrap_or(data.len());
            let text = std::str::from_utf8(&data[start..end]).unwrap_or("<invalid utf8>");
            print!("{}", text);
        })
        .map_err(|e| format!("Failed to register env.printString: {}", e))?;

    linker
        .func_wrap("env", "printNewline", || {
            println!();
        })
        .map_err(|e| format!("Failed to register env.printNewline: {}", e))?;

    let instance = linker
        .instantiate(&mut store, &module)
        .map_err(|e| format!("Failed to instantiate module: {}", e))?;

    let main = instance
        .get_func(&mut store, "main")
        .ok_or_else(|| "No main routine found".to_string())?;

    let result_count = main.ty(&store).results().len();
    let mut results = vec![Val::I32(0); result_count];
    main.call(&mut store, &[], &mut results)
        .map_err(|e| format!("Execution failed: {}", e))?;

    std::io::stdout().flush().ok();
    Ok(())
}

fn print_usage() {
    eprintln!("Rout Compiler");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  routc compile <source.rout> [output_dir]   Compile to .wat and .wasm (default output/)");
    eprintln!("  routc run <source.rout>                    Compile and execute");
    eprintln!("  routc <source.rout>                        Compile (shorthand)");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        2 => {
            // routc <file.rout> — default to compile
            cmd_compile(&args[1], "output");
        }
        3 => match args[1].as_str() {
            "compile" => cmd_compile(&args[2], "output"),
            "run" => cmd_run(&args[2]),
            _ => {
                eprintln!("Unknown command: {}", args[1]);
                print_usage();
                std::process::exit(1);
            }
        },
        4 if args[1] == "compile" => {
            cmd_compile(&args[2], &args[3]);
        }
        _ => {
            print_usage();
            std::process::exit(1);
        }
    }
}
