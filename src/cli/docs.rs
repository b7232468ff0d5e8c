//! Documentation content for the sluice CLI

use super::CliError;

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Syntax,
    Stages,
    Terminals,
    Expressions,
    Methods,
    Config,
}

impl DocCategory {
    /// Parse category name from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "syntax" => Some(Self::Syntax),
            "stages" | "stage" => Some(Self::Stages),
            "terminals" | "terminal" | "collectors" => Some(Self::Terminals),
            "expressions" | "expression" | "operators" | "ops" => Some(Self::Expressions),
            "methods" | "method" => Some(Self::Methods),
            "config" | "configuration" => Some(Self::Config),
            _ => None,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r#"SLUICE DOCUMENTATION

sluice runs declarative pipelines over a JSON array of records. A query
starts with $ (the whole array) and chains stages with |. The last stage may
be a terminal that reduces the records to a single result.

DOCUMENTATION CATEGORIES

  syntax        Query shape, $ and @, field access
  stages        filter, expand, map, sort, limit, skip
  terminals     collect, count, avg, sum, group_by, partition_by, ...
  expressions   Literals, comparison, logical and arithmetic operators
  methods       Methods on strings and arrays
  config        Settings file

QUICK REFERENCE

  $                     The source array
  @                     The current record
  @[field]  @.field     Field access
  $ | filter(...) | sort(...) | limit(2)

Run 'sluice doc <category>' for detailed documentation.
"#
}

/// Get documentation for a specific category
pub fn get_doc_category(name: &str) -> Result<&'static str, CliError> {
    match DocCategory::parse(name) {
        Some(DocCategory::Syntax) => Ok(SYNTAX_DOC),
        Some(DocCategory::Stages) => Ok(STAGES_DOC),
        Some(DocCategory::Terminals) => Ok(TERMINALS_DOC),
        Some(DocCategory::Expressions) => Ok(EXPRESSIONS_DOC),
        Some(DocCategory::Methods) => Ok(METHODS_DOC),
        Some(DocCategory::Config) => Ok(CONFIG_DOC),
        None => Err(CliError::UnknownCategory(name.to_string())),
    }
}

const SYNTAX_DOC: &str = r#"SYNTAX

  $ | stage | stage | ... | terminal

$ is the input array. Every stage receives the records produced by the stage
before it. Inside a stage argument, @ is the record being looked at.

FIELD ACCESS

  @[name]           Field by name
  @.name            Same, dot form
  @["first name"]   Quoted field names
  @[books][0]       Array index
  @[books][-1]      Last element

Missing fields evaluate to null.

EXAMPLES

  $ | filter(@[age] > 5) | sort(@[name])
  $ | expand(@[books]) | filter(@[published])
"#;

const STAGES_DOC: &str = r#"STAGES

  filter(pred)        Keep records where pred is true. Order is preserved.
  expand(children)    Replace each record with the array children evaluates
                      to, flattening one level. Alias: flat_map.
  map(expr)           Replace each record with expr.
  sort                Sort records by their natural order.
  sort(key)           Sort by key. Stable: equal keys keep their order.
  sort_desc(key)      Descending, also stable.
  limit(n)            Keep the first n records.
  skip(n)             Drop the first n records.

A stage that needs an argument fails when it is missing:

  $ | filter()        => Invalid argument: filter() requires a predicate
"#;

const TERMINALS_DOC: &str = r#"TERMINALS

A terminal must be the last stage. Without one the records are collected.

  collect             The records as an array
  count               Number of records
  avg / avg(expr)     Mean as a float; null when there are no records
  sum / sum(expr)     Integer sum when every value is an integer
  group_by(key)       Object keyed by the key's string form. Only keys that
                      occur are present: an empty input gives {}
  partition_by(pred)  Object with both "true" and "false", always. An empty
                      input gives {"false": [], "true": []}
  any_match(pred)     true if any record matches
  all_match(pred)     true if every record matches
  join / join(sep)    Records concatenated into a string

EXAMPLES

  $ | expand(@[books]) | avg(@[price])
  $ | partition_by(@[age] >= 10)
"#;

const EXPRESSIONS_DOC: &str = r#"EXPRESSIONS

LITERALS
  42  3.14  "text"  'text'  true  false  null
  [1, 2, 3]  {name: @[name], age: @[age]}

COMPARISON
  ==  !=  <  >  <=  >=      1 == 1.0 is true

LOGICAL
  and  or  not              Short-circuiting

ARITHMETIC
  +  -  *  /  %             + also concatenates strings
                            Whole mixed results stay integers: 100 * 1.1 => 110
                            Division by zero is an error
"#;

const METHODS_DOC: &str = r#"METHODS

ARRAYS
  .count()            Number of elements
  .any(pred)          true if any element matches; @ is the element
  .all(pred)          true if every element matches
  .contains(x)        Membership

STRINGS
  .length()           Character count (also works on arrays and objects)
  .upper()  .lower()
  .startswith(s)  .endswith(s)  .contains(s)
  .matches(regex)

ANY VALUE
  .type()             "null", "boolean", "integer", "float", "string",
                      "array" or "object"

EXAMPLE

  $ | filter(@[active] and @[books].any(@[published]))
"#;

const CONFIG_DOC: &str = r#"CONFIG

Pass a TOML file with --config. Every field is optional.

  [output]
  pretty = false        # pretty-print JSON
  lines = false         # one line per element

  [query]
  absent = "empty"      # avg over nothing: empty (null), default, fail
  default_value = 0.0   # used when absent = "default"

  [logging]
  level = "warn"        # used when RUST_LOG is unset
"#;
