use regsub::{host, Pattern};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("regsub=trace")),
        )
        .init();

    let re = Pattern::new("([a-z]+)-([0-9]+)").unwrap();
    let out = re.replace(b"id: abc-123", b"%2/%1").call().unwrap();
    assert_eq!(out.as_deref(), Some(&b"id: 123/abc"[..]));

    let re = Pattern::builder()
        .case_insensitive(true)
        .build("^[[:alpha:]]+$")
        .unwrap();
    assert!(re.is_match(b"LaVie"));

    // Replace-all through the host entry points, as a script would call them
    let re = host::call("regex/compile", &[host::Value::from("o")]).unwrap();
    let out = host::call(
        "regex/replace",
        &[re, "foo boo".into(), "0".into(), host::Value::keyword("all")],
    )
    .unwrap();
    println!("{out}");
}
