//! Host-relative path macros
//!
//! Descriptors are first built with literal placeholder tokens and then run
//! through [`expand`], which swaps each token for the media server's own
//! `${...}` macro syntax. Tokens are delimited by double underscores, so no
//! token is a prefix of another.

/// Virtual host configuration directory
pub const VHOST_CONFIG_HOME: &str = "__VHOST_CONFIG_HOME__";
/// Name of the incoming source stream (transcoder templates)
pub const SOURCE_STREAM_NAME: &str = "__SOURCE_STREAM_NAME__";
/// Running application instance
pub const APPLICATION_INSTANCE: &str = "__APPLICATION_INSTANCE__";
/// Application name
pub const APPLICATION: &str = "__APPLICATION__";

const EXPANSIONS: [(&str, &str); 4] = [
    (VHOST_CONFIG_HOME, "${com.wowza.wms.context.VHostConfigHome}"),
    (SOURCE_STREAM_NAME, "${SourceStreamName}"),
    (
        APPLICATION_INSTANCE,
        "${com.wowza.wms.context.ApplicationInstance}",
    ),
    (APPLICATION, "${com.wowza.wms.context.Application}"),
];

/// Replace every placeholder token with its macro
#[must_use]
pub fn expand(content: &str) -> String {
    EXPANSIONS
        .iter()
        .fold(content.to_string(), |acc, (token, macro_text)| {
            acc.replace(token, macro_text)
        })
}

/// Whether any placeholder token survives in `content`
#[must_use]
pub fn has_placeholders(content: &str) -> bool {
    EXPANSIONS.iter().any(|(token, _)| content.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_token_expands_whole() {
        let input = format!("{VHOST_CONFIG_HOME}/applications/{APPLICATION}/so/{APPLICATION_INSTANCE}");
        let out = expand(&input);

        assert_eq!(
            out,
            "${com.wowza.wms.context.VHostConfigHome}/applications/\
             ${com.wowza.wms.context.Application}/so/\
             ${com.wowza.wms.context.ApplicationInstance}"
        );
        assert!(!has_placeholders(&out));
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(expand("APPLICATION live"), "APPLICATION live");
        assert!(!has_placeholders("nothing here"));
    }
}
