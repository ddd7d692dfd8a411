// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use vacancy_crawler::utils::telemetry;

    #[test]
    fn test_telemetry_initialization() {
        telemetry::init_telemetry();

        tracing::debug!("This is a debug message");
        tracing::info!(
            url = "https://jobs.dou.ua/vacancies/?exp=1-3",
            clicks = 3,
            "The 'Load more' button has been pressed"
        );
        tracing::warn!(error = "timeout", "Failed to fetch detail page");
    }

    #[test]
    fn test_repeated_initialization_is_harmless() {
        telemetry::init_telemetry();
        telemetry::init_telemetry();
    }
}
