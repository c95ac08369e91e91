// src/stats/render.rs
//
// Self-contained dashboard rendering for the stats endpoint. One template
// serves both presentation variants; a ViewConfig decides which derived
// cards appear and how wide the chart window is. Bootstrap data is inlined
// so the page renders without a round trip; the refresh button re-fetches
// the JSON form and redraws client-side.

use crate::stats::aggregate::AggregateResult;
use serde_json::json;

/// Presentation knobs for one rendering of an AggregateResult.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub title: &'static str,
    /// None = all-history chart, Some(n) = fixed n-day window.
    pub window_days: Option<usize>,
    /// Show DAU/WAU and the average-minutes-present estimate.
    pub show_active_users: bool,
}

impl ViewConfig {
    pub fn all_history() -> Self {
        Self {
            title: "Read Stats",
            window_days: None,
            show_active_users: false,
        }
    }

    pub fn trailing_window(days: usize) -> Self {
        Self {
            title: "Read Stats (Recent)",
            window_days: Some(days),
            show_active_users: true,
        }
    }
}

pub fn render_dashboard(
    doc_id: &str,
    result: &AggregateResult,
    view: &ViewConfig,
    chart_origin: &str,
) -> String {
    let bootstrap = serde_json::to_string(result).unwrap_or_else(|_| "{}".into());
    let meta = json!({
        "docId": doc_id,
        "title": view.title,
        "windowDays": view.window_days,
        "showActive": view.show_active_users,
    });

    DASHBOARD_HTML
        .replace("__CHART_ORIGIN__", chart_origin)
        .replace("__VIEW_META__", &escape_for_inline_script(&meta.to_string()))
        .replace("__STATS_DATA__", &escape_for_inline_script(&bootstrap))
}

/// JSON is not safe to inline into a <script> block as-is: serde_json
/// escapes quotes but not `<`, so a `</script>` inside a string value (the
/// document id comes from the request path) would terminate the script
/// element. `<` denotes the same character in both JSON and JS.
fn escape_for_inline_script(json: &str) -> String {
    json.replace('<', "\\u003c")
}

/// Dashboard HTML template. `__STATS_DATA__` is replaced with the current
/// AggregateResult JSON, `__VIEW_META__` with the view configuration and
/// `__CHART_ORIGIN__` with the configured chart CDN origin.
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"><meta name="viewport" content="width=device-width,initial-scale=1.0">
<title>Read Stats - hookwatch</title>
<style>
*{margin:0;padding:0;box-sizing:border-box}
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;background:#0a0a0f;color:#e4e4ef;min-height:100vh}
.container{max-width:960px;margin:0 auto;padding:24px}
.header{display:flex;justify-content:space-between;align-items:center;margin-bottom:24px}
.header h1{font-size:20px;font-weight:700;letter-spacing:-0.5px}
.header h1 span{color:#6c63ff}
.refresh{padding:8px 16px;border-radius:8px;background:#14141f;border:1px solid #2a2a3a;color:#8888a0;cursor:pointer;font-size:13px}
.refresh:hover{border-color:#6c63ff;color:#e4e4ef}
.cards{display:grid;grid-template-columns:repeat(auto-fit,minmax(160px,1fr));gap:16px;margin-bottom:24px}
.card{background:#14141f;border:1px solid #2a2a3a;border-radius:12px;padding:20px}
.card .lbl{font-size:12px;color:#8888a0;text-transform:uppercase;letter-spacing:0.5px;margin-bottom:8px}
.card .val{font-size:32px;font-weight:700}
.card .val.purple{color:#6c63ff}
.card .val.green{color:#00d4aa}
.card .val.blue{color:#00a8ff}
.card .val.amber{color:#ffb020}
.section{background:#14141f;border:1px solid #2a2a3a;border-radius:12px;padding:20px;margin-bottom:16px}
.section h2{font-size:15px;margin-bottom:16px;font-weight:600;color:#c0c0d0}
.empty{color:#555;font-style:italic;font-size:13px;padding:20px;text-align:center}
.footer{text-align:center;font-size:11px;color:#555;padding:16px}
canvas{max-height:260px}
</style>
<script src="__CHART_ORIGIN__/npm/chart.js"></script>
</head>
<body>
<div class="container">
<div class="header"><h1>Read <span>Stats</span></h1><button class="refresh" id="refresh">Refresh</button></div>
<div class="cards" id="cards"></div>
<div class="section"><h2 id="chart-title">Daily PV / UV</h2><canvas id="chart"></canvas><div class="empty" id="chart-empty" style="display:none">No reads recorded yet</div></div>
<div class="footer" id="foot"></div>
</div>
<script>
var V=__VIEW_META__;
var D=__STATS_DATA__;
var chart=null;
function card(lbl,val,color){return '<div class="card"><div class="lbl">'+lbl+'</div><div class="val '+color+'">'+val+'</div></div>'}
function render(){
var html=card('Total PV',fmt(D.totalPv),'purple')+card('Total UV',fmt(D.totalUv),'green');
if(V.showActive){
html+=card('Yesterday DAU',fmt(D.yesterdayDau),'blue')+card('WAU',fmt(D.wau),'blue');
var n=D.pvSeries.length;
var lastPv=n?D.pvSeries[n-1]:0;
var lastUv=n?D.uvSeries[n-1]:0;
if(lastUv>0){html+=card('Avg Minutes',(lastPv/lastUv/3).toFixed(1),'amber')}
}
document.getElementById('cards').innerHTML=html;
document.getElementById('chart-title').textContent=V.windowDays?('Last '+V.windowDays+' Days'):'Daily PV / UV';
var hasData=D.pvSeries.some(function(x){return x>0});
document.getElementById('chart-empty').style.display=(D.days.length===0||(!V.windowDays&&!hasData))?'block':'none';
if(chart){chart.destroy()}
if(typeof Chart!=='undefined'&&D.days.length>0){
chart=new Chart(document.getElementById('chart'),{type:'line',data:{labels:D.days,datasets:[
{label:'PV',data:D.pvSeries,borderColor:'#6c63ff',backgroundColor:'rgba(108,99,255,0.15)',fill:true,tension:0.3},
{label:'UV',data:D.uvSeries,borderColor:'#00d4aa',backgroundColor:'rgba(0,212,170,0.1)',fill:true,tension:0.3}
]},options:{responsive:true,scales:{y:{beginAtZero:true,ticks:{precision:0}}}}});
}
document.getElementById('foot').textContent='Document '+V.docId+' · Updated '+new Date().toLocaleTimeString();
}
document.getElementById('refresh').addEventListener('click',function(){
fetch(window.location.pathname+'?format=json&refresh=1').then(function(r){return r.json()}).then(function(d){D=d;render()}).catch(function(){});
});
render();
</script>
</body></html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AggregateResult {
        AggregateResult {
            days: vec!["2024-05-01".into()],
            pv_series: vec![3],
            uv_series: vec![2],
            total_pv: 3,
            total_uv: 2,
            yesterday_dau: Some(1),
            wau: Some(2),
        }
    }

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let html = render_dashboard(
            "doc1",
            &sample(),
            &ViewConfig::trailing_window(10),
            "https://cdn.example.com",
        );
        assert!(!html.contains("__STATS_DATA__"));
        assert!(!html.contains("__VIEW_META__"));
        assert!(!html.contains("__CHART_ORIGIN__"));
        assert!(html.contains("https://cdn.example.com/npm/chart.js"));
        assert!(html.contains("\"totalPv\":3"));
        assert!(html.contains("\"windowDays\":10"));
    }

    #[test]
    fn test_doc_id_cannot_terminate_script_block() {
        let html = render_dashboard(
            "</script><script>alert(1)</script>",
            &sample(),
            &ViewConfig::all_history(),
            "https://cdn",
        );
        assert!(!html.contains("</script><script>alert(1)"));
        assert!(html.contains("\\u003c/script"));
    }

    #[test]
    fn test_all_history_view_hides_active_cards() {
        let html = render_dashboard("doc1", &sample(), &ViewConfig::all_history(), "https://cdn");
        assert!(html.contains("\"showActive\":false"));
        assert!(html.contains("\"windowDays\":null"));
    }
}
