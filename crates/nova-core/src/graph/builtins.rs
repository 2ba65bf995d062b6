//! Identifiers never reported as external references.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::Language;

static DUNDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^__\w+__$").unwrap());

static PYTHON_BUILTINS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // functions
        "abs", "all", "any", "ascii", "bin", "bool", "breakpoint", "bytearray", "bytes",
        "callable", "chr", "classmethod", "compile", "complex", "delattr", "dict", "dir",
        "divmod", "enumerate", "eval", "exec", "filter", "float", "format", "frozenset",
        "getattr", "globals", "hasattr", "hash", "help", "hex", "id", "input", "int",
        "isinstance", "issubclass", "iter", "len", "list", "locals", "map", "max",
        "memoryview", "min", "next", "object", "oct", "open", "ord", "pow", "print",
        "property", "range", "repr", "reversed", "round", "set", "setattr", "slice",
        "sorted", "staticmethod", "str", "sum", "super", "tuple", "type", "vars", "zip",
        // exceptions
        "Exception", "BaseException", "ValueError", "TypeError", "KeyError", "IndexError",
        "AttributeError", "RuntimeError", "NotImplementedError", "StopIteration",
        "OSError", "IOError", "ImportError", "AssertionError", "ZeroDivisionError",
        // common container and string methods
        "append", "extend", "insert", "remove", "pop", "clear", "copy", "count", "index",
        "sort", "reverse", "get", "items", "keys", "values", "update", "setdefault", "add",
        "discard", "join", "split", "rsplit", "strip", "lstrip", "rstrip", "replace",
        "lower", "upper", "startswith", "endswith", "encode", "decode", "splitlines",
    ]
    .into_iter()
    .collect()
});

static C_STDLIB: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // stdio
        "printf", "fprintf", "sprintf", "snprintf", "vprintf", "vfprintf", "vsnprintf",
        "scanf", "fscanf", "sscanf", "puts", "fputs", "putchar", "fputc", "getchar", "fgetc",
        "fgets", "fopen", "fclose", "fread", "fwrite", "fflush", "fseek", "ftell", "rewind",
        "perror", "remove", "rename",
        // stdlib
        "malloc", "calloc", "realloc", "free", "exit", "abort", "atexit", "atoi", "atol",
        "atof", "strtol", "strtoul", "strtod", "qsort", "bsearch", "rand", "srand", "abs",
        "labs", "getenv", "system",
        // string
        "strlen", "strcpy", "strncpy", "strcat", "strncat", "strcmp", "strncmp", "strchr",
        "strrchr", "strstr", "strtok", "strdup", "memcpy", "memmove", "memset", "memcmp",
        // misc
        "assert", "sizeof", "isalpha", "isdigit", "isspace", "isalnum", "toupper", "tolower",
        "time", "clock", "sqrt", "pow", "floor", "ceil", "fabs", "sin", "cos", "tan", "log",
        "exp",
    ]
    .into_iter()
    .collect()
});

static CPP_STDLIB: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "cout", "cerr", "endl", "move", "forward", "swap", "make_shared", "make_unique",
        "make_pair", "make_tuple", "get", "begin", "end", "cbegin", "cend", "size", "empty",
        "push_back", "emplace_back", "pop_back", "push_front", "pop_front", "insert",
        "emplace", "erase", "clear", "find", "count", "at", "front", "back", "data",
        "reserve", "resize", "sort", "min", "max", "to_string", "stoi", "stol", "stod",
        "static_cast", "dynamic_cast", "reinterpret_cast", "const_cast", "c_str", "substr",
        "length", "append", "reset", "release", "lock", "unlock", "join", "detach",
    ]
    .into_iter()
    .collect()
});

/// `__name__`, judged on the final segment of a qualified identifier.
pub fn is_dunder(identifier: &str) -> bool {
    let last = identifier
        .rsplit(['.', ':'])
        .next()
        .unwrap_or(identifier);
    DUNDER_RE.is_match(last)
}

/// Builtin or standard-library names for `language`.
pub fn is_builtin(language: Language, identifier: &str) -> bool {
    match language {
        Language::Python => PYTHON_BUILTINS.contains(identifier),
        Language::C => C_STDLIB.contains(identifier),
        Language::Cpp => {
            identifier.starts_with("std::")
                || CPP_STDLIB.contains(identifier)
                || C_STDLIB.contains(identifier)
        }
    }
}

/// Whether an undefined identifier may be listed as an external reference.
pub fn is_reportable_external(language: Language, identifier: &str) -> bool {
    !is_builtin(language, identifier) && !is_dunder(identifier)
}
