//! Dashboard page and the label formatting shared with the CLI summary.

use chrono::{Datelike, NaiveDate};
use serde_json::json;
use std::fmt::Write;

use crate::constants;
use crate::pipeline::processing::{self, NormalizedRecord, RangeFilter, SourceColumn};

/// Line colors, one per balance bucket in chart order
pub const SERIES_COLORS: [&str; 5] = ["#1F77B4", "#FF7F0E", "#2CA02C", "#D62728", "#9467BD"];

/// X-axis tick spacing (in data points) for each range; `None` lets the chart decide
pub const fn tick_interval(filter: RangeFilter) -> Option<u32> {
    match filter {
        RangeFilter::All => Some(365),
        RangeFilter::TwelveMonths => Some(30),
        RangeFilter::ThreeMonths => Some(15),
        RangeFilter::OneMonth => Some(7),
        RangeFilter::Ytd => None,
    }
}

/// Y-axis label: one decimal with `M`/`K` suffixes
pub fn format_axis_value(value: f64) -> String {
    abbreviate(value, 1, "M", "K")
}

/// Tooltip value: two decimals with `m`/`k` suffixes
pub fn format_tooltip_value(value: f64) -> String {
    abbreviate(value, 2, "m", "k")
}

fn abbreviate(value: f64, decimals: usize, millions: &str, thousands: &str) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.abs() >= 1e6 {
        format!("{:.*}{}", decimals, value / 1e6, millions)
    } else if value.abs() >= 1e3 {
        format!("{:.*}{}", decimals, value / 1e3, thousands)
    } else {
        format!("{:.*}", decimals, value)
    }
}

/// X-axis label for `date`, coarser for wider ranges
pub fn format_axis_date(date: NaiveDate, filter: RangeFilter) -> String {
    match filter {
        RangeFilter::All => date.year().to_string(),
        RangeFilter::TwelveMonths => format!("{}/{}", date.month(), date.year()),
        RangeFilter::Ytd | RangeFilter::ThreeMonths | RangeFilter::OneMonth => {
            format!("{}/{}/{}", date.month(), date.day(), date.year())
        }
    }
}

/// Tooltip heading, e.g. `Feb 2, 2023`
pub fn format_tooltip_label(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Text summary of a filtered selection: the latest record's value for each
/// series, headed by its date and the span covered, labelled the way the chart
/// axis labels that range.
pub fn format_summary(records: &[NormalizedRecord], range: RangeFilter) -> String {
    let Some(latest) = processing::latest_date(records) else {
        return format!("No dated records in range {}\n", range);
    };
    let earliest = records
        .iter()
        .filter_map(|r| r.time.date())
        .min()
        .unwrap_or(latest);
    // Last occurrence wins when the export repeats a date
    let Some(record) = records.iter().rev().find(|r| r.time.date() == Some(latest)) else {
        return format!("No dated records in range {}\n", range);
    };

    let mut out = format!(
        "📊 {} (range {}, {} records, {} to {})\n",
        format_tooltip_label(latest),
        range,
        records.len(),
        format_axis_date(earliest, range),
        format_axis_date(latest, range),
    );
    for column in SourceColumn::BALANCES {
        let _ = writeln!(
            out,
            "   {:<7} {}",
            column.output_key(),
            format_tooltip_value(record.value(column))
        );
    }
    out
}

/// Render the single page dashboard.
///
/// Filter names, tick intervals and series keys are injected from the Rust
/// definitions so the page cannot drift from the API.
pub fn render_page() -> String {
    let filters: Vec<_> = RangeFilter::ALL
        .iter()
        .map(|f| json!({ "name": f.as_str(), "interval": tick_interval(*f) }))
        .collect();
    let series: Vec<_> = SourceColumn::BALANCES
        .iter()
        .zip(SERIES_COLORS)
        .map(|(c, color)| json!({ "key": c.output_key(), "color": color }))
        .collect();

    PAGE_TEMPLATE
        .replace("__ENDPOINT__", constants::BTC_ADDRESSES_ROUTE)
        .replace("__FILTERS__", &serde_json::Value::from(filters).to_string())
        .replace("__SERIES__", &serde_json::Value::from(series).to_string())
}

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>BTC Address Balances over Time</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"></script>
    <style>
      body { font-family: sans-serif; margin: 0; }
      .container { max-width: 56rem; margin: 0 auto; padding: 2rem; text-align: center; }
      .chart { height: 24rem; }
      .filters { display: flex; justify-content: flex-end; gap: 0.75rem; margin-top: 0.75rem; }
      .filters button { height: 2rem; width: 3rem; border: 0; border-radius: 0.25rem; color: #fff; background: #6b7280; cursor: pointer; }
      .filters button:hover { opacity: 0.5; }
      .filters button.selected { background: #3b82f6; }
      .error { color: #b00020; }
    </style>
  </head>
  <body>
    <section class="container">
      <div class="chart"><canvas id="chart"></canvas></div>
      <div id="filters" class="filters"></div>
      <div id="error" class="error"></div>
    </section>
    <script>
      const ENDPOINT = "__ENDPOINT__";
      const FILTERS = __FILTERS__;
      const SERIES = __SERIES__;
      let selected = "All";
      let chart = null;

      function abbreviate(num, digits, m, k) {
        if (Math.abs(num) >= 1e6) return (num / 1e6).toFixed(digits) + m;
        if (Math.abs(num) >= 1e3) return (num / 1e3).toFixed(digits) + k;
        return num.toFixed(digits);
      }

      function axisDate(time) {
        const d = new Date(time);
        const day = d.getUTCDate(), month = d.getUTCMonth() + 1, year = d.getUTCFullYear();
        switch (selected) {
          case "12M": return month + "/" + year;
          case "3M": case "1M": case "YTD": return month + "/" + day + "/" + year;
          default: return String(year);
        }
      }

      function tooltipDate(time) {
        return new Date(time).toLocaleDateString("en-US", { year: "numeric", month: "short", day: "numeric", timeZone: "UTC" });
      }

      function renderButtons() {
        const root = document.getElementById("filters");
        root.innerHTML = "";
        for (const f of FILTERS) {
          const b = document.createElement("button");
          b.textContent = f.name;
          if (f.name === selected) b.className = "selected";
          b.onclick = () => { selected = f.name; renderButtons(); load(); };
          root.appendChild(b);
        }
      }

      async function load() {
        const error = document.getElementById("error");
        error.textContent = "";
        let data;
        try {
          const res = await fetch(ENDPOINT + "?range=" + encodeURIComponent(selected));
          data = await res.json();
          if (!res.ok) throw new Error(data.message + ": " + data.error);
        } catch (e) {
          error.textContent = String(e);
          return;
        }
        const interval = FILTERS.find((f) => f.name === selected).interval;
        const datasets = SERIES.map((s) => ({
          label: s.key,
          data: data.map((row) => row[s.key]),
          borderColor: s.color,
          backgroundColor: s.color,
          pointRadius: 0,
          pointHoverRadius: 8,
          pointHoverBorderColor: "#fff",
          pointHoverBorderWidth: 2,
        }));
        if (chart) chart.destroy();
        chart = new Chart(document.getElementById("chart"), {
          type: "line",
          data: { labels: data.map((row) => row.time), datasets },
          options: {
            maintainAspectRatio: false,
            interaction: { mode: "index", intersect: false },
            scales: {
              x: {
                ticks: {
                  autoSkip: interval === null,
                  callback: function (value, index) {
                    if (interval !== null && index % interval !== 0) return null;
                    return axisDate(this.getLabelForValue(value));
                  },
                },
              },
              y: { ticks: { callback: (v) => abbreviate(v, 1, "M", "K") } },
            },
            plugins: {
              tooltip: {
                callbacks: {
                  title: (items) => tooltipDate(items[0].label),
                  label: (item) => item.dataset.label + ": " + abbreviate(item.parsed.y, 2, "m", "k"),
                },
              },
            },
          },
        });
      }

      renderButtons();
      load();
    </script>
  </body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_axis_value_abbreviation() {
        assert_eq!(format_axis_value(1_234_567.0), "1.2M");
        assert_eq!(format_axis_value(-2_500.0), "-2.5K");
        assert_eq!(format_axis_value(5.0), "5.0");
        assert_eq!(format_axis_value(999.94), "999.9");
    }

    #[test]
    fn test_tooltip_value_abbreviation() {
        assert_eq!(format_tooltip_value(12_345_678.0), "12.35m");
        assert_eq!(format_tooltip_value(1_500.0), "1.50k");
        assert_eq!(format_tooltip_value(0.126), "0.13");
        assert_eq!(format_tooltip_value(f64::NAN), "NaN");
    }

    #[test]
    fn test_axis_dates_per_range() {
        let date = ymd(2023, 2, 2);
        assert_eq!(format_axis_date(date, RangeFilter::All), "2023");
        assert_eq!(format_axis_date(date, RangeFilter::TwelveMonths), "2/2023");
        assert_eq!(format_axis_date(date, RangeFilter::ThreeMonths), "2/2/2023");
        assert_eq!(format_axis_date(date, RangeFilter::Ytd), "2/2/2023");
        assert_eq!(format_tooltip_label(date), "Feb 2, 2023");
    }

    fn record(time: &str, base: f64) -> NormalizedRecord {
        let mut row = crate::types::RawRow::new();
        row.insert("Time".to_string(), time.to_string());
        for (i, column) in SourceColumn::BALANCES.iter().enumerate() {
            row.insert(
                column.source_header().to_string(),
                (base * 10f64.powi(i as i32)).to_string(),
            );
        }
        processing::normalize_row(&row)
    }

    #[test]
    fn test_summary_of_empty_selection() {
        assert_eq!(
            format_summary(&[], RangeFilter::OneMonth),
            "No dated records in range 1M\n"
        );
        let undated = vec![record("not a date", 1.0)];
        assert_eq!(
            format_summary(&undated, RangeFilter::All),
            "No dated records in range All\n"
        );
    }

    #[test]
    fn test_summary_reports_latest_values() {
        let records = vec![
            record("2022-03-01", 1.0),
            record("2023-02-02", 1_500.0),
            record("garbage", 9.0),
        ];
        let summary = format_summary(&records, RangeFilter::TwelveMonths);
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "📊 Feb 2, 2023 (range 12M, 3 records, 3/2022 to 2/2023)");
        assert_eq!(lines[1], "   >$1k    1.50k");
        assert_eq!(lines[2], "   >$10k   15.00k");
        assert_eq!(lines[5], "   >$10m   15.00m");
    }

    #[test]
    fn test_summary_span_follows_range_labels() {
        let records = vec![record("2021-06-30", 1.0), record("2023-02-02", 2.0)];
        let summary = format_summary(&records, RangeFilter::All);
        assert!(summary.starts_with("📊 Feb 2, 2023 (range All, 2 records, 2021 to 2023)\n"));
    }

    #[test]
    fn test_page_lists_every_filter_and_series() {
        let page = render_page();
        assert!(page.contains("BTC Address Balances over Time"));
        assert!(!page.contains("__FILTERS__"));
        assert!(!page.contains("__SERIES__"));
        for filter in RangeFilter::ALL {
            assert!(page.contains(&format!("\"name\":\"{}\"", filter.as_str())));
        }
        for column in SourceColumn::BALANCES {
            assert!(page.contains(column.output_key()));
        }
        assert!(page.contains("\"interval\":null"));
    }
}
