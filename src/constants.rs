//! Common constants used throughout stamp.

/// Ignore file name, honored in every directory of a walked input tree.
pub const IGNORE_FILE: &str = ".stampignore";

/// Default configuration file, loaded from the working directory when present.
pub const CONFIG_FILE: &str = ".stamp.yaml";

/// Name given to a template supplied inline on the command line.
pub const ARG_TEMPLATE_NAME: &str = "<arg>";

/// Name given to the synthesized output mapping template.
pub const OUTPUT_MAP_NAME: &str = "<OutputMap>";

/// Name given to strings rendered through `tpl` / `tmpl.inline`.
pub const INLINE_TEMPLATE_NAME: &str = "<inline>";

/// Path sentinel for the standard input and output streams.
pub const STDIO: &str = "-";

/// Mode used when neither an explicit mode nor a source file mode is available.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Default template delimiters.
pub const DEFAULT_LEFT_DELIM: &str = "{{";
pub const DEFAULT_RIGHT_DELIM: &str = "}}";
