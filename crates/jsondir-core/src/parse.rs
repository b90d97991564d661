use crate::errors::ParseError;
use crate::query::{Clause, Condition, Filter, Operator, Query};
use crate::util::parse_number;
use crate::value::Primitive;

/// Parses one `path:operator:value` clause. The value is everything after
/// the second colon, so it may itself contain colons.
pub fn parse_clause(raw: &str) -> Result<Clause, ParseError> {
    let mut parts = raw.splitn(3, ':');
    let (Some(path), Some(op), Some(val)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ParseError::InvalidFilterClause(raw.to_string()));
    };
    let condition = match op.parse::<Operator>()? {
        Operator::Number(op) => {
            let n = parse_number(val).ok_or_else(|| ParseError::InvalidFilterValue(val.into()))?;
            Condition::Number(op, n)
        }
        Operator::Sub => Condition::Sub(val.to_string()),
        Operator::Primitive(op) => Condition::Primitive(op, coerce_primitive(val)),
    };
    Ok(Clause::new(path.split('.'), condition))
}

// No escaping: the string "true" can never be matched as a string.
fn coerce_primitive(val: &str) -> Primitive {
    match val {
        "true" => Primitive::Bool(true),
        "false" => Primitive::Bool(false),
        "null" => Primitive::Null,
        _ => match parse_number(val) {
            Some(n) => Primitive::Number(n),
            None => Primitive::String(val.to_string()),
        },
    }
}

fn parse_index(raw: &str, err: ParseError) -> Result<usize, ParseError> {
    raw.trim().parse::<usize>().map_err(|_| err)
}

/// Builds a [`Query`] from decoded query-string pairs, in the order they
/// appeared. Unknown parameters are ignored.
pub fn parse_search_params<I, K, V>(params: I) -> Result<Query, ParseError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut select: Vec<String> = Vec::new();
    let mut has_select = false;
    let mut limit = None;
    let mut offset = None;
    let mut filter_params: Vec<String> = Vec::new();
    for (key, value) in params {
        let value = value.as_ref();
        match key.as_ref() {
            "select" => {
                has_select = true;
                select.push(value.to_string());
            }
            "limit" if limit.is_none() => limit = Some(value.to_string()),
            "offset" if offset.is_none() => offset = Some(value.to_string()),
            "filter" => filter_params.push(value.to_string()),
            _ => {}
        }
    }

    let mut query = Query::default();
    if has_select {
        query.select = Some(select.join(",").split(',').map(str::to_string).collect());
    }
    if let Some(raw) = limit {
        query.limit = Some(parse_index(&raw, ParseError::InvalidLimit)?);
    }
    if let Some(raw) = offset {
        query.offset = Some(parse_index(&raw, ParseError::InvalidOffset)?);
    }
    if !filter_params.is_empty() {
        let filters = filter_params
            .iter()
            .map(|group| group.split(',').map(parse_clause).collect::<Result<Filter, _>>())
            .collect::<Result<Vec<_>, _>>()?;
        query.filters = Some(filters);
    }
    Ok(query)
}
