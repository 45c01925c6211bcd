use super::api::SourceHost;
use crate::config::error::ConfigError;
use crate::models::{Language, RepositoryNwo};

/// Determine the languages to analyse.
///
/// Uses the comma-separated `input` when it names anything, otherwise asks the
/// source host which languages the repository contains. Duplicates are
/// dropped, keeping first-seen order.
///
/// # Arguments
/// * `input` - The workflow `languages` input
/// * `repository` - Repository queried for auto-detection
/// * `host` - The source-hosting client
///
/// # Errors
/// * [`ConfigError::NoLanguages`] when neither the input nor detection yields a language
/// * [`ConfigError::UnknownLanguages`] listing every unsupported input name
pub async fn get_languages<H>(
    input: &str,
    repository: &RepositoryNwo,
    host: &H,
) -> Result<Vec<Language>, ConfigError>
where
    H: SourceHost + ?Sized,
{
    let mut names: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    tracing::info!("Languages from configuration: {:?}", names);

    if names.is_empty() {
        names = detect_languages(repository, host).await?;
        tracing::info!("Automatically detected languages: {:?}", names);
    }

    if names.is_empty() {
        return Err(ConfigError::NoLanguages);
    }

    let mut languages = Vec::new();
    let mut unknown = Vec::new();
    for name in names {
        match Language::parse_language(&name) {
            Some(language) if !languages.contains(&language) => languages.push(language),
            Some(_) => {}
            None => unknown.push(name),
        }
    }

    if !unknown.is_empty() {
        return Err(ConfigError::UnknownLanguages { languages: unknown });
    }

    Ok(languages)
}

/// Supported languages of the repository, most bytes first.
async fn detect_languages<H>(
    repository: &RepositoryNwo,
    host: &H,
) -> Result<Vec<String>, ConfigError>
where
    H: SourceHost + ?Sized,
{
    let mut detected: Vec<(String, u64)> = host
        .list_languages(&repository.owner, &repository.repo)
        .await?
        .into_iter()
        .collect();
    detected.sort_by(|a, b| b.1.cmp(&a.1));

    let mut languages: Vec<Language> = Vec::new();
    for (name, _) in detected {
        match Language::parse_language(&name) {
            Some(language) if !languages.contains(&language) => languages.push(language),
            Some(_) => {}
            None => tracing::debug!("Ignoring unsupported repository language {}", name),
        }
    }

    Ok(languages.iter().map(|l| l.as_str().to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api::MockHost;
    use indexmap::IndexMap;

    fn repository() -> RepositoryNwo {
        RepositoryNwo::parse("octo/widgets").unwrap()
    }

    fn host_detecting(languages: &[(&str, u64)]) -> MockHost {
        let detected: IndexMap<String, u64> = languages
            .iter()
            .map(|(name, bytes)| (name.to_string(), *bytes))
            .collect();
        let mut host = MockHost::new();
        host.expect_list_languages()
            .times(1)
            .returning(move |_, _| Ok(detected.clone()));
        host
    }

    #[tokio::test]
    async fn test_explicit_input_skips_detection() {
        let mut host = MockHost::new();
        host.expect_list_languages().never();

        let languages = get_languages(" javascript, Python ,javascript", &repository(), &host)
            .await
            .unwrap();
        assert_eq!(languages, vec![Language::Javascript, Language::Python]);
    }

    #[tokio::test]
    async fn test_aliases_resolve_to_same_language() {
        let host = MockHost::new();
        let languages = get_languages("c,c++,cpp", &repository(), &host).await.unwrap();
        assert_eq!(languages, vec![Language::Cpp]);
    }

    #[tokio::test]
    async fn test_unknown_languages_are_listed() {
        let host = MockHost::new();
        match get_languages("javascript,rust,cobol", &repository(), &host).await {
            Err(ConfigError::UnknownLanguages { languages }) => {
                assert_eq!(languages, vec!["rust", "cobol"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_detection_orders_by_size_and_ignores_unsupported() {
        let host = host_detecting(&[
            ("Shell", 9_000),
            ("Python", 500),
            ("TypeScript", 4_000),
            ("JavaScript", 2_000),
        ]);

        let languages = get_languages("", &repository(), &host).await.unwrap();
        assert_eq!(languages, vec![Language::Javascript, Language::Python]);
    }

    #[tokio::test]
    async fn test_nothing_detected() {
        let host = host_detecting(&[("Shell", 100), ("Dockerfile", 20)]);
        assert!(matches!(
            get_languages(" , ", &repository(), &host).await,
            Err(ConfigError::NoLanguages)
        ));
    }
}
