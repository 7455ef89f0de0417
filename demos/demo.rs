use sovran_keymap::{
    Consumer, FnConsumer, InputStream, KeyVariant, List, MapError, PrintStream, TypeMap,
};
use std::collections::LinkedList;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber when `KEYMAP_LOG` or `RUST_LOG` is set
fn init_tracing() {
    let filter = match std::env::var("KEYMAP_LOG") {
        Ok(directives) => EnvFilter::builder().parse_lossy(directives),
        Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        Err(_) => return,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut map = TypeMap::new();

    map.put(KeyVariant::out()?, Rc::new(PrintStream::stdout()))?;
    map.put(KeyVariant::input()?, Rc::new(InputStream::stdin()))?;
    map.put(KeyVariant::err()?, Rc::new(PrintStream::stderr()))?;

    let out = map.get(KeyVariant::out()?)?.ok_or("OUT was just stored")?;
    let err = map.get(KeyVariant::err()?)?.ok_or("ERR was just stored")?;

    map.put(KeyVariant::a_double()?, Rc::new(std::f64::consts::PI))?;
    map.put(KeyVariant::an_integer()?, Rc::new(-8))?;
    map.put(KeyVariant::string()?, Rc::new("Hi there, {}!".to_string()))?;
    map.put(KeyVariant::another_double()?, Rc::new(std::f64::consts::E))?;

    out.println("")?;

    if let Some(pi) = map.get(KeyVariant::a_double()?)? {
        out.println(pi.cos())?;
    }
    if let Some(i) = map.get(KeyVariant::an_integer()?)? {
        out.println(i.signum())?;
    }
    if let Some(format) = map.get(KeyVariant::string()?)? {
        out.println(format.replace("{}", "user"))?;
    }
    if let Some(e) = map.get(KeyVariant::another_double()?)? {
        out.println(e.ln())?;
    }

    out.print("Your name? ")?;
    out.flush()?;
    if let Some(input) = map.get(KeyVariant::input()?)? {
        match input.read_line()? {
            Some(name) => out.println(format!("Hello, {}", name.trim()))?,
            None => out.println("(no input)")?,
        }
    }

    let floats_key = KeyVariant::floats_random_access()?;
    let floats: Rc<dyn List> = Rc::new(vec![1.5f32, 2.5, 4.0]);
    map.put(floats_key, floats)?;
    if let Some(floats) = map.get(floats_key)? {
        let first = floats.element_as::<f32>(0);
        out.println(format!("{} floats stored, first is {:?}", floats.len(), first))?;
    }

    // A linked list is a list but not a random-access one
    let linked: Rc<dyn List> = Rc::new(LinkedList::from([1.0f32]));
    match map.put(floats_key, linked) {
        Err(rejected @ MapError::TypeMismatch { .. }) => err.println(rejected)?,
        Err(other) => return Err(other.into()),
        Ok(_) => err.println("linked list was unexpectedly accepted")?,
    }

    let println: Rc<dyn Consumer> = Rc::new(out.println_consumer());
    map.put(KeyVariant::out_println_string()?, println)?;
    if let Some(println) = map.get(KeyVariant::out_println_string()?)? {
        println.accept(Rc::new("printed by the stored consumer".to_string()))?;
    }

    // Only the consumer shape is checked, so a consumer of integers gets in
    let signs: Rc<dyn Consumer> = Rc::new(FnConsumer::new(|n: &i32| println!("{}", n.signum())));
    let coerced = KeyVariant::out_println_string()?.coerce_cast(signs)?;
    map.put(KeyVariant::out_println_string()?, coerced)?;
    if let Some(println) = map.get(KeyVariant::out_println_string()?)? {
        if let Err(mismatch) = println.accept(Rc::new("not an integer".to_string())) {
            err.println(mismatch)?;
        }
    }

    out.flush()?;
    Ok(())
}
