use clap::Parser;
use mono_reflect::{
    config::{RuntimeConfig, LOG_ENV},
    host::{self, InitOptions},
    Class, Domain, Method, MonoApi, Type,
};
use std::{path::PathBuf, process::ExitCode};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Dump the fields, properties and methods of a managed class"
)]
struct Args {
    /// The assembly to load (path to a DLL or EXE)
    assembly: PathBuf,
    /// The full name of the class to dump (e.g. Game.Player); lists every
    /// class in the assembly when omitted
    class_name: Option<String>,
    /// Include members inherited from base classes
    #[arg(short, long)]
    inherited: bool,
    /// Path to the Mono runtime library (overrides MONO_REFLECT_LIB)
    #[arg(long, value_name = "LIB")]
    runtime: Option<PathBuf>,
    /// Load debug symbols for managed code
    #[arg(long)]
    debug: bool,
}

fn register_tracer() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .parse_lossy("")
    });
    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    register_tracer();

    let mut config = RuntimeConfig::from_env();
    if args.runtime.is_some() {
        config.library = args.runtime.clone();
    }
    config.debug_symbols |= args.debug;

    let mono = match MonoApi::load(&config) {
        Ok(mono) => mono,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    host::core_initialize(
        &mono,
        &InitOptions {
            debug_symbols: config.debug_symbols,
        },
    );
    if let Err(e) = mono.jit_init("dump-class") {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let Some(image) = Domain::root(&mono)
        .and_then(|domain| domain.open_assembly(&args.assembly))
        .and_then(|assembly| assembly.image())
    else {
        eprintln!("Could not open assembly {}", args.assembly.display());
        return ExitCode::FAILURE;
    };

    eprintln!(
        "Assembly: {}, Classes: {}",
        image.name().unwrap_or_default(),
        image.classes().count()
    );

    let Some(class_name) = &args.class_name else {
        for class in image.classes() {
            println!("  {}", class.full_name().unwrap_or_default());
        }
        return ExitCode::SUCCESS;
    };

    match image.find_class_by_full_name(class_name) {
        Some(class) => {
            print_class_info(class, args.inherited);
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("Class '{}' not found in assembly", class_name);
            println!("\nAvailable classes:");
            for class in image.classes() {
                println!("  {}", class.full_name().unwrap_or_default());
            }
            ExitCode::FAILURE
        }
    }
}

fn type_name(ty: Option<Type>) -> String {
    ty.and_then(Type::name).unwrap_or_else(|| "?".to_string())
}

fn signature(method: Method) -> String {
    let params: Vec<_> = method.param_types().map(|t| type_name(Some(t))).collect();
    format!(
        "{} {}({})",
        type_name(method.return_type()),
        method.name().unwrap_or_default(),
        params.join(", ")
    )
}

/// `  [Base]` suffix for members found above the dumped class.
fn origin<'rt>(class: Class<'rt>, declaring: Class<'rt>) -> String {
    if class == declaring {
        String::new()
    } else {
        format!("  [{}]", declaring.full_name().unwrap_or_default())
    }
}

fn print_class_info(class: Class, inherited: bool) {
    let chain: Vec<_> = class.ancestors().filter_map(Class::full_name).collect();
    println!("Class: {}", chain.join(" : "));

    let fields: Vec<_> = if inherited {
        class.fields_upward().collect()
    } else {
        class.fields().map(|f| (f, class)).collect()
    };
    println!("\nFields:");
    for (field, declaring) in fields {
        println!(
            "  - {}: {} @ {}{}",
            field.name().unwrap_or_default(),
            type_name(field.field_type()),
            field.offset().map(|o| o.to_string()).unwrap_or_default(),
            origin(class, declaring)
        );
    }

    let properties: Vec<_> = if inherited {
        class.properties_upward().collect()
    } else {
        class.properties().map(|p| (p, class)).collect()
    };
    println!("\nProperties:");
    for (prop, declaring) in properties {
        println!(
            "  - {}: getter: {}, setter: {}{}",
            prop.name().unwrap_or_default(),
            prop.getter().map(signature).unwrap_or_else(|| "-".into()),
            prop.setter().map(signature).unwrap_or_else(|| "-".into()),
            origin(class, declaring)
        );
    }

    let methods: Vec<_> = if inherited {
        class.methods_upward().collect()
    } else {
        class.methods().map(|m| (m, class)).collect()
    };
    println!("\nMethods:");
    for (method, declaring) in methods {
        println!("  - {}{}", signature(method), origin(class, declaring));
    }
}
