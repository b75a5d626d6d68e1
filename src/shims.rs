//! Source transformer - environment shims for sandboxed submissions
//!
//! JavaScript/TypeScript submissions get HackerRank-style ergonomics
//! injected as plain text prepended to the user's source: a line-cursor
//! `input()` helper over the request's stdin, a print helper, and (when the
//! source requires `express`) a module-loader patch that swaps the real
//! framework for an in-memory fake so instructor test code can assert on
//! registered routes without the sandbox opening a network listener.
//!
//! Injection is purely textual. The user's source is never parsed or
//! modified; shims are concatenated in front of it, so syntax errors in the
//! submission surface later as provider compile/runtime errors.
//!
//! All other languages pass through byte-for-byte.

use std::sync::OnceLock;

use regex::Regex;

/// Marker line separating injected helpers from user code
const SHIM_MARKER: &str = "// Environment Shims";

/// Shared stdin/cursor logic, JavaScript flavor. `input()` hands out one
/// line per call and returns an empty string once exhausted; it must never
/// throw or block, and must not consume anything unless the user calls it.
const STDIN_SHIM_JS_BODY: &str = r#"
const __LEARNIX_LINES = __LEARNIX_STDIN.split("\n");
let __learnixCursor = 0;
function input() {
  return __learnixCursor < __LEARNIX_LINES.length
    ? __LEARNIX_LINES[__learnixCursor++]
    : "";
}
function print(...args) {
  console.log(...args);
}
"#;

/// TypeScript flavor: typed helpers, and the print helper is renamed to
/// `println` because the compiler's dom lib already declares `print`.
const STDIN_SHIM_TS_BODY: &str = r#"
const __LEARNIX_LINES: string[] = __LEARNIX_STDIN.split("\n");
let __learnixCursor: number = 0;
function input(): string {
  return __learnixCursor < __LEARNIX_LINES.length
    ? __LEARNIX_LINES[__learnixCursor++]
    : "";
}
function println(...args: any[]): void {
  console.log(...args);
}
"#;

/// Module-loader patch replacing `express` with an in-memory fake.
///
/// Route registrations and `listen` calls are recorded into
/// `__LEARNIX_MOCK__`, which lives inside the sandboxed process (the shim
/// and the submission are one file, so a top-level const is visible to the
/// appended test code). `expectRoute`/`expectListening` are the assertion
/// helpers instructor-authored test code uses against that record. Any
/// other module name falls through to the real loader.
const EXPRESS_SHIM_JS: &str = r#"// Sandboxed Module Shims
const __LEARNIX_MOCK__ = { routes: [], listening: false, ports: [] };
const __learnixModule = require("module");
const __learnixLoad = __learnixModule._load;
__learnixModule._load = function (request, parent, isMain) {
  if (request === "express") {
    const express = function () {
      const app = {};
      const record = function (method) {
        return function (path) {
          __LEARNIX_MOCK__.routes.push({
            method: method,
            path: typeof path === "string" ? path : "*",
          });
          return app;
        };
      };
      app.get = record("GET");
      app.post = record("POST");
      app.put = record("PUT");
      app.delete = record("DELETE");
      app.all = record("ALL");
      app.use = record("USE");
      app.listen = function (port, cb) {
        __LEARNIX_MOCK__.listening = true;
        __LEARNIX_MOCK__.ports.push(port);
        if (typeof cb === "function") cb();
        return {
          close: function (done) {
            if (typeof done === "function") done();
          },
        };
      };
      return app;
    };
    express.json = function () { return function () {}; };
    express.urlencoded = function () { return function () {}; };
    return express;
  }
  try {
    return __learnixLoad.apply(this, arguments);
  } catch (err) {
    console.warn("[sandbox] failed to load module '" + request + "': " + err.message);
    throw err;
  }
};
function expectRoute(method, path) {
  const wanted = String(method).toUpperCase();
  const hit = __LEARNIX_MOCK__.routes.some(function (r) {
    return r.method === wanted && r.path === path;
  });
  if (!hit) {
    throw new Error("Expected route " + wanted + " " + path + " to be registered");
  }
}
function expectListening() {
  if (!__LEARNIX_MOCK__.listening) {
    throw new Error("Expected app.listen() to have been called");
  }
}
"#;

/// TypeScript variant of the express fake. `require` is reached through
/// eval so the compiler accepts the file without node type declarations.
const EXPRESS_SHIM_TS: &str = r#"// Sandboxed Module Shims
const __LEARNIX_MOCK__: any = { routes: [], listening: false, ports: [] };
const __learnixModule: any = eval("require")("module");
const __learnixLoad: any = __learnixModule._load;
__learnixModule._load = function (request: string, parent: any, isMain: boolean): any {
  if (request === "express") {
    const express: any = function (): any {
      const app: any = {};
      const record = function (method: string) {
        return function (path: any): any {
          __LEARNIX_MOCK__.routes.push({
            method: method,
            path: typeof path === "string" ? path : "*",
          });
          return app;
        };
      };
      app.get = record("GET");
      app.post = record("POST");
      app.put = record("PUT");
      app.delete = record("DELETE");
      app.all = record("ALL");
      app.use = record("USE");
      app.listen = function (port: any, cb: any): any {
        __LEARNIX_MOCK__.listening = true;
        __LEARNIX_MOCK__.ports.push(port);
        if (typeof cb === "function") cb();
        return {
          close: function (done: any): void {
            if (typeof done === "function") done();
          },
        };
      };
      return app;
    };
    express.json = function (): any { return function (): void {}; };
    express.urlencoded = function (): any { return function (): void {}; };
    return express;
  }
  try {
    return __learnixLoad.apply(this, arguments);
  } catch (err: any) {
    console.warn("[sandbox] failed to load module '" + request + "': " + err.message);
    throw err;
  }
};
function expectRoute(method: string, path: string): void {
  const wanted = String(method).toUpperCase();
  const hit = __LEARNIX_MOCK__.routes.some(function (r: any): boolean {
    return r.method === wanted && r.path === path;
  });
  if (!hit) {
    throw new Error("Expected route " + wanted + " " + path + " to be registered");
  }
}
function expectListening(): void {
  if (!__LEARNIX_MOCK__.listening) {
    throw new Error("Expected app.listen() to have been called");
  }
}
"#;

/// Matches an intended `require('express')` / `require("express")` call,
/// tolerating internal whitespace. The quote must close right after the
/// module name so `express-session` and friends do not match.
fn express_require_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"require\s*\(\s*(?:'express'|"express")\s*\)"#)
            .expect("invalid express require pattern")
    })
}

/// Whether the submission appears to load `express`.
///
/// Textual heuristic: a matching substring inside a comment or string
/// literal also triggers the shim. Accepted false positive; the fake is
/// inert unless the program actually calls it.
pub fn uses_express(source: &str) -> bool {
    express_require_pattern().is_match(source)
}

/// Build the stdin/print shim for the given flavor. The raw stdin string
/// is embedded JSON-encoded so embedded newlines and quotes survive as a
/// valid string literal.
fn stdin_shim(stdin: &str, typescript: bool) -> String {
    let encoded = serde_json::to_string(stdin).unwrap_or_else(|_| "\"\"".to_string());
    if typescript {
        format!(
            "{}\nconst __LEARNIX_STDIN: string = {};{}",
            SHIM_MARKER, encoded, STDIN_SHIM_TS_BODY
        )
    } else {
        format!(
            "{}\nconst __LEARNIX_STDIN = {};{}",
            SHIM_MARKER, encoded, STDIN_SHIM_JS_BODY
        )
    }
}

/// Produce the prepared source for a submission.
///
/// JavaScript/TypeScript get the stdin shim prepended, and the express fake
/// prepended before that when the source requires it, so the final order is
/// sandbox shim, stdin shim, user code. The sandbox shim patches the module
/// loader and must run before anything can call `require`. Every other
/// language returns the source unchanged.
pub fn prepare_source(language: &str, source: &str, stdin: &str) -> String {
    let typescript = match language.to_lowercase().as_str() {
        "javascript" => false,
        "typescript" => true,
        _ => return source.to_string(),
    };

    let mut prepared = format!("{}\n{}", stdin_shim(stdin, typescript), source);

    if uses_express(source) {
        let sandbox_shim = if typescript {
            EXPRESS_SHIM_TS
        } else {
            EXPRESS_SHIM_JS
        };
        prepared = format!("{}\n{}", sandbox_shim, prepared);
    }

    prepared
}
