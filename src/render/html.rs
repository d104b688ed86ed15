use crate::model::ReportData;

/// Render a self-contained HTML report (data embedded as JSON, charts drawn
/// by ECharts from a CDN).
///
/// Important: we avoid `format!()` because the HTML contains many `{}` from JS
/// template literals (e.g., `${x}`), which would conflict with Rust formatting.
pub fn render_html_report(data: &ReportData) -> anyhow::Result<String> {
    let json = serde_json::to_string(data)?; // embedded as JS object literal

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Graph benchmark results</title>
<script src="https://cdn.jsdelivr.net/npm/echarts@5/dist/echarts.min.js"></script>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  main { padding: 12px 16px; }
  .summary { display: flex; gap: 16px; flex-wrap: wrap; font-size: 14px; color: #333; }
  .pill { padding: 4px 8px; border: 1px solid #ddd; border-radius: 999px; background: #fafafa; }
  .charts { display: grid; grid-template-columns: repeat(auto-fill, minmax(520px, 1fr)); gap: 16px; }
  .chart { height: 420px; border: 1px solid #eee; border-radius: 6px; }
  .muted { color: #777; font-size: 12px; }
  .warn { color: #a15c00; font-size: 13px; }
  table { border-collapse: collapse; margin-top: 8px; }
  th, td { border-bottom: 1px solid #eee; padding: 4px 8px; text-align: left; font-size: 13px; }
</style>
</head>
<body>
<header>
  <div class="summary" id="summary"></div>
</header>
<main>
  <div id="warnings"></div>
  <h2>By node count</h2>
  <div class="charts">
    <div class="chart" id="average"></div>
    <div class="chart" id="median"></div>
    <div class="chart" id="timeoutRate"></div>
    <div class="chart" id="timeoutCount"></div>
  </div>
  <div id="gridSection" style="display:none;">
    <h2>By node count and edge probability</h2>
    <div class="charts">
      <div class="chart" id="heatAverage"></div>
      <div class="chart" id="heatMedian"></div>
      <div class="chart" id="heatTimeout"></div>
      <div class="chart" id="halfTimeout"></div>
    </div>
  </div>
  <div id="skipped"></div>
</main>

<script>
// Embedded report data (JSON object literal)
const DATA = __DATA__;

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function isMarker(v) {
  return v !== null && typeof v === "object";
}

function maxNumber(values) {
  const nums = values.filter((v) => !isMarker(v));
  return nums.length ? Math.max(...nums) : 1;
}

// "No data" is drawn at the top of the axis in its own color, never as 0.
function cell(v, top) {
  if (!isMarker(v)) return v;
  return {
    value: top,
    itemStyle: { color: v.color },
    symbol: "diamond",
    symbolSize: 12,
    label: { show: true, position: "top", formatter: v.label, color: v.color }
  };
}

function renderSummary() {
  const t = DATA.totals;
  document.getElementById("summary").innerHTML = `
    <span class="pill">file: <b>${escapeHtml(DATA.source)}</b></span>
    <span class="pill">rows: <b>${t.rows}</b></span>
    <span class="pill">skipped: <b>${t.skipped}</b></span>
    <span class="pill">successes: <b>${t.successes}</b></span>
    <span class="pill">timeouts: <b>${t.timeouts}</b></span>
    <span class="pill">out of memory: <b>${t.out_of_memory}</b></span>
    <span class="pill">found: <b>${t.found}</b></span>
    <span class="pill">expected runs per group: <b>${DATA.expected_runs}</b></span>
  `;
}

function renderWarnings() {
  if (!DATA.warnings.length) return;
  document.getElementById("warnings").innerHTML =
    DATA.warnings.map((w) => `<div class="warn">${escapeHtml(w)}</div>`).join("");
}

function renderSkipped() {
  if (!DATA.skipped.length) return;
  const rows = DATA.skipped.map((s) => `
    <tr><td>${s.line ?? "?"}</td><td>${escapeHtml(s.reason.kind)}</td>
    <td><code>${escapeHtml(s.reason.detail ?? "")}</code></td></tr>`).join("");
  document.getElementById("skipped").innerHTML = `
    <h2>Skipped rows</h2>
    <table><thead><tr><th>line</th><th>reason</th><th>value</th></tr></thead>
    <tbody>${rows}</tbody></table>`;
}

function lineChart(id, title, yName, series, kind) {
  const top = maxNumber(series.values) * 1.1;
  echarts.init(document.getElementById(id)).setOption({
    title: { text: title },
    tooltip: { trigger: "axis" },
    xAxis: { type: "category", name: "Number of nodes", data: series.labels },
    yAxis: { type: "value", name: yName },
    series: [{ type: kind, data: series.values.map((v) => cell(v, top)) }]
  });
}

// No-data cells live in a second series outside the visualMap, so they keep
// their marker color and still get drawn.
function heatmap(id, title, triples, grid) {
  const measured = triples.filter((t) => !isMarker(t[2]));
  const nums = measured.map((t) => t[2]);
  const markers = triples.filter((t) => isMarker(t[2])).map(([x, y, v]) => ({
    value: [x, y, 0],
    itemStyle: { color: v.color },
    label: { show: true, formatter: v.label, color: "#fff" }
  }));
  echarts.init(document.getElementById(id)).setOption({
    title: { text: title },
    tooltip: { position: "top" },
    xAxis: { type: "category", name: "Number of nodes", data: grid.x_labels },
    yAxis: { type: "category", name: "Edge probability", data: grid.y_labels },
    visualMap: {
      seriesIndex: 0,
      min: nums.length ? Math.min(...nums) : 0,
      max: nums.length ? Math.max(...nums) : 1,
      calculable: true, orient: "horizontal", left: "center", bottom: 0
    },
    grid: { bottom: 80 },
    series: [
      { type: "heatmap", name: "measured", data: measured, label: { show: false } },
      { type: "heatmap", name: "no data", data: markers,
        tooltip: { formatter: (p) => `${grid.x_labels[p.value[0]]} nodes, p=${grid.y_labels[p.value[1]]}: no successful run` } }
    ]
  });
}

function renderGrid() {
  const g = DATA.grid;
  if (!g) return;
  document.getElementById("gridSection").style.display = "block";
  if (g.error) {
    for (const id of ["heatAverage", "heatMedian", "heatTimeout"]) {
      document.getElementById(id).innerHTML = `<p class="warn">${escapeHtml(g.error)}</p>`;
    }
  } else {
    heatmap("heatAverage", "Average run time (ms)", g.average, g);
    heatmap("heatMedian", "Median run time (ms)", g.median, g);
    heatmap("heatTimeout", "Timeouts (%)", g.timeout_rate, g);
  }
  const top = maxNumber(g.half_timeout.values) * 1.1;
  echarts.init(document.getElementById("halfTimeout")).setOption({
    title: { text: "Minimum nodes for 50% timeouts" },
    tooltip: { trigger: "axis" },
    xAxis: { type: "category", name: "Edge probability", data: g.half_timeout.labels },
    yAxis: { type: "value", name: "Number of nodes" },
    series: [{ type: "bar", data: g.half_timeout.values.map((v) => cell(v, top)) }]
  });
}

renderSummary();
renderWarnings();
lineChart("average", "Average run time of successful runs", "ms", DATA.average, "line");
lineChart("median", "Median run time of successful runs", "ms", DATA.median, "line");
lineChart("timeoutRate", "Timeouts (%)", "%", DATA.timeout_rate, "bar");
lineChart("timeoutCount", "Number of timeouts", "timeouts", DATA.timeout_count, "bar");
renderGrid();
renderSkipped();
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace("__DATA__", &json))
}
