use std::borrow::Cow;

use serde::Serialize;

/// Shader stage a [`Snippet`] is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetHook {
    /// Runs once per fragment after every layer was combined; writes `cogl_color_out`.
    Fragment,
    /// Runs after a layer's combine step; reads and writes `cogl_layer`.
    LayerFragment,
    /// Replaces or wraps the texture lookup of one layer.
    TextureLookup,
}

/// One named shader function. `source` defines `vec4 <name> (vec4 color)` (or the `vec3`
/// equivalent for color-state stages).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OpSnippet {
    pub name: Cow<'static, str>,
    pub source: Cow<'static, str>,
}

impl OpSnippet {
    pub const fn from_static(name: &'static str, source: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            source: Cow::Borrowed(source),
        }
    }

    pub fn owned(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            source: Cow::Owned(source.into()),
        }
    }
}

/// Shader fragment attached to a pipeline hook: global declarations plus code spliced before,
/// in place of, or after the hooked stage.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Snippet {
    hook: SnippetHook,
    declarations: String,
    pre: String,
    replace: Option<String>,
    post: String,
}

impl Snippet {
    pub fn new(hook: SnippetHook, declarations: impl Into<String>, post: impl Into<String>) -> Self {
        Self {
            hook,
            declarations: declarations.into(),
            pre: String::new(),
            replace: None,
            post: post.into(),
        }
    }

    /// Chains `ops` so each consumes the previous output: `color = op (color);`.
    ///
    /// The chain starts from `input` and stores its result in `output`.
    pub fn from_ops(hook: SnippetHook, ops: &[&OpSnippet], input: &str, output: &str) -> Self {
        let mut declarations = String::new();
        let mut post = format!("  vec4 color = {input};\n");
        for op in ops {
            declarations.push_str(&op.source);
            if !op.source.ends_with('\n') {
                declarations.push('\n');
            }
            post.push_str(&format!("  color = {} (color);\n", op.name));
        }
        post.push_str(&format!("  {output} = color;\n"));
        Self::new(hook, declarations, post)
    }

    pub fn with_pre(mut self, pre: impl Into<String>) -> Self {
        self.pre = pre.into();
        self
    }

    pub fn with_replace(mut self, replace: impl Into<String>) -> Self {
        self.replace = Some(replace.into());
        self
    }

    pub fn hook(&self) -> SnippetHook {
        self.hook
    }

    pub fn declarations(&self) -> &str {
        &self.declarations
    }

    pub fn pre(&self) -> &str {
        &self.pre
    }

    pub fn replace(&self) -> Option<&str> {
        self.replace.as_deref()
    }

    pub fn post(&self) -> &str {
        &self.post
    }

    /// Full shader text in hook order, for logging and the CLI.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.declarations);
        out.push_str("\n/* main */\n");
        out.push_str(&self.pre);
        if let Some(replace) = &self.replace {
            out.push_str(replace);
        }
        out.push_str(&self.post);
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/color/snippet.rs"]
mod tests;
