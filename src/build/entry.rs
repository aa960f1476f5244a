//! Entry source generation
//!
//! Wraps a component file in the few lines of JSX the bundler needs to turn
//! it into either a server render call or a client hydration call. Props
//! (and, on the server, the request location) are left as free globals so
//! they can be injected into the cached bundle per request.

use crate::cache::Flavor;
use crate::paths::to_slash;
use std::fmt::Write;
use std::path::Path;

/// Global the server bundle stores its rendered markup in
pub const SERVER_OUTPUT_GLOBAL: &str = "__rendr_html";

/// Global holding the request location for server-side routing
pub const LOCATION_GLOBAL: &str = "__rendr_location";

/// What to wrap around the page component
#[derive(Debug, Clone, Copy)]
pub struct EntryOptions<'a> {
    /// Page component (absolute path)
    pub component: &'a Path,
    /// Layout component wrapping the page
    pub layout: Option<&'a Path>,
    /// Stylesheet imported for its side effects
    pub layout_css: Option<&'a Path>,
    /// Wrap in react-router
    pub router: bool,
}

/// Generate the entry source for `flavor`
///
/// The raw client entry never imports the layout or its stylesheet.
pub fn generate(flavor: Flavor, options: &EntryOptions<'_>) -> String {
    let wrap = flavor != Flavor::ClientRaw;
    let layout = options.layout.filter(|_| wrap);
    let layout_css = options.layout_css.filter(|_| wrap);

    let mut src = String::from("import React from \"react\";\n");
    if let Some(css) = layout_css {
        let _ = writeln!(src, "import {};", js_string(&to_slash(css)));
    }
    if let Some(layout) = layout {
        let _ = writeln!(src, "import Layout from {};", js_string(&to_slash(layout)));
    }

    match flavor {
        Flavor::Server => {
            src.push_str("import { renderToString } from \"react-dom/server.browser\";\n");
            if options.router {
                src.push_str("import { StaticRouter } from \"react-router-dom/server\";\n");
            }
        }
        Flavor::Client | Flavor::ClientRaw => {
            src.push_str("import { hydrateRoot } from \"react-dom/client\";\n");
            if options.router {
                src.push_str("import { BrowserRouter } from \"react-router-dom\";\n");
            }
        }
    }
    let _ = writeln!(
        src,
        "import App from {};",
        js_string(&to_slash(options.component))
    );

    let mut tree = String::from("<App {...props} />");
    if layout.is_some() {
        tree = format!("<Layout>{tree}</Layout>");
    }

    match flavor {
        Flavor::Server => {
            if options.router {
                tree = format!("<StaticRouter location={{{LOCATION_GLOBAL}}}>{tree}</StaticRouter>");
            }
            src.push_str("console.log = () => {};\n");
            let _ = writeln!(
                src,
                "globalThis.{SERVER_OUTPUT_GLOBAL} = renderToString({tree});"
            );
        }
        Flavor::Client | Flavor::ClientRaw => {
            if options.router {
                tree = format!("<BrowserRouter>{tree}</BrowserRouter>");
            }
            let _ = writeln!(
                src,
                "hydrateRoot(document.getElementById(\"root\"), {tree});"
            );
        }
    }

    src
}

/// Quote a string as a JavaScript string literal
pub fn js_string(value: &str) -> String {
    // JSON strings are valid JS literals once the two line separators
    // JSON allows raw are escaped.
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options<'a>(component: &'a Path) -> EntryOptions<'a> {
        EntryOptions {
            component,
            layout: None,
            layout_css: None,
            router: false,
        }
    }

    #[test]
    fn server_entry_stores_markup_global() {
        let src = generate(Flavor::Server, &options(Path::new("/app/Home.tsx")));

        assert!(src.contains("import App from \"/app/Home.tsx\";"));
        assert!(src.contains("react-dom/server.browser"));
        assert!(src.contains("console.log = () => {};"));
        assert!(src.contains("globalThis.__rendr_html = renderToString(<App {...props} />);"));
    }

    #[test]
    fn client_entry_hydrates_root() {
        let src = generate(Flavor::Client, &options(Path::new("/app/Home.tsx")));

        assert!(src.contains("import { hydrateRoot } from \"react-dom/client\";"));
        assert!(src.contains(
            "hydrateRoot(document.getElementById(\"root\"), <App {...props} />);"
        ));
        assert!(!src.contains("console.log"));
    }

    #[test]
    fn layout_wraps_server_and_client_but_not_raw() {
        let layout = Path::new("/app/Layout.tsx");
        let css = Path::new("/app/.rendr/layout.css");
        let opts = EntryOptions {
            component: Path::new("/app/Home.tsx"),
            layout: Some(layout),
            layout_css: Some(css),
            router: false,
        };

        for flavor in [Flavor::Server, Flavor::Client] {
            let src = generate(flavor, &opts);
            assert!(src.contains("import Layout from \"/app/Layout.tsx\";"));
            assert!(src.contains("import \"/app/.rendr/layout.css\";"));
            assert!(src.contains("<Layout><App {...props} /></Layout>"));
        }

        let raw = generate(Flavor::ClientRaw, &opts);
        assert!(!raw.contains("Layout"));
        assert!(!raw.contains("layout.css"));
    }

    #[test]
    fn router_uses_injected_location() {
        let opts = EntryOptions {
            router: true,
            ..options(Path::new("/app/Home.tsx"))
        };

        let server = generate(Flavor::Server, &opts);
        assert!(server.contains("<StaticRouter location={__rendr_location}>"));

        let client = generate(Flavor::Client, &opts);
        assert!(client.contains("<BrowserRouter><App {...props} /></BrowserRouter>"));
    }

    #[test]
    fn js_string_escapes_quotes_and_separators() {
        assert_eq!(js_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(js_string("x\u{2028}y"), "\"x\\u2028y\"");
    }
}
