//! Single-page UI

/// Index HTML template
pub(crate) const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Travel Companion</title>
    <style>
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f5f5f5;
            color: #333;
            line-height: 1.6;
        }
        .container { max-width: 760px; margin: 0 auto; padding: 20px; }
        header {
            background: #2c3e50;
            color: white;
            padding: 20px;
            margin-bottom: 20px;
        }
        header h1 { font-size: 28px; }
        .card {
            background: white;
            border-radius: 8px;
            padding: 20px;
            margin-bottom: 20px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        .card h2 { font-size: 20px; margin-bottom: 10px; }
        .card h3 { font-size: 16px; color: #666; margin: 12px 0 4px; }
        #preview { display: none; width: 250px; margin-top: 12px; border-radius: 4px; }
        #place-name {
            padding-bottom: 6px;
            border-bottom: 3px solid;
            border-image: linear-gradient(to right, red, orange, yellow, green, blue, violet) 1;
        }
        .btn {
            background: #3498db;
            color: white;
            border: none;
            padding: 10px 20px;
            border-radius: 4px;
            cursor: pointer;
            margin-top: 12px;
        }
        .btn:hover { background: #2980b9; }
        .btn:disabled { background: #95a5a6; cursor: default; }
        .hidden { display: none; }
        .status { color: #666; font-style: italic; margin-top: 8px; }
        .error { color: #c0392b; margin-top: 8px; }
        pre { white-space: pre-wrap; font-family: inherit; }
    </style>
</head>
<body>
    <header>
        <h1>Travel Companion</h1>
    </header>
    <div class="container">
        <div class="card">
            <h2>Upload an image</h2>
            <input type="file" id="upload" accept=".jpg,.jpeg,.png,image/jpeg,image/png">
            <img id="preview" alt="Uploaded image">
            <div>
                <button class="btn hidden" id="identify">Identify</button>
            </div>
            <div class="status" id="status"></div>
            <div class="error" id="error"></div>
        </div>

        <div class="card hidden" id="info">
            <h2 id="place-name"></h2>
            <p id="place-description"></p>
            <h3>Location</h3>
            <pre id="place-location"></pre>
        </div>

        <div class="card hidden" id="weather-card">
            <h3>Weather</h3>
            <pre id="weather"></pre>
            <div class="error" id="weather-error"></div>
            <button class="btn" id="refresh-weather">Refresh weather</button>
        </div>
    </div>
    <script>
        const $ = (id) => document.getElementById(id);
        let sessionId = sessionStorage.getItem('travel-companion-session');

        async function ensureSession() {
            if (sessionId) {
                const res = await fetch(`/api/sessions/${sessionId}`);
                if (res.ok) {
                    render(await res.json());
                    return;
                }
            }
            const res = await fetch('/api/sessions', { method: 'POST' });
            sessionId = (await res.json()).session_id;
            sessionStorage.setItem('travel-companion-session', sessionId);
            render(null);
        }

        function setStatus(text) { $('status').textContent = text || ''; }
        function setError(text) { $('error').textContent = text || ''; }

        async function readError(res) {
            try { return (await res.json()).error; } catch (e) { return res.statusText; }
        }

        function render(view, weatherError) {
            $('identify').classList.toggle('hidden', !(view && view.has_image));

            const id = view && view.identification;
            $('info').classList.toggle('hidden', !id);
            if (id) {
                $('place-name').textContent = id.name;
                $('place-description').textContent = id.description;
                $('place-location').textContent = id.location;
            }

            const weather = view && view.weather;
            $('weather-card').classList.toggle('hidden', !id);
            $('weather').textContent = weather ? weather.report : '';
            $('weather-error').textContent = weatherError || '';
        }

        function putImage(file) {
            return fetch(`/api/sessions/${sessionId}/image`, {
                method: 'PUT',
                headers: { 'Content-Type': file.type || 'image/jpeg' },
                body: file,
            });
        }

        $('upload').addEventListener('change', async (event) => {
            const file = event.target.files[0];
            if (!file) return;
            setError('');
            $('preview').src = URL.createObjectURL(file);
            $('preview').style.display = 'block';

            let res = await putImage(file);
            if (res.status === 404) {
                // Idle sessions are swept server-side
                sessionStorage.removeItem('travel-companion-session');
                sessionId = null;
                await ensureSession();
                res = await putImage(file);
            }
            if (!res.ok) {
                setError(await readError(res));
                return;
            }
            render((await res.json()).view);
        });

        $('identify').addEventListener('click', async () => {
            $('identify').disabled = true;
            setError('');
            setStatus('Identifying...');
            try {
                const res = await fetch(`/api/sessions/${sessionId}/identify`, { method: 'POST' });
                if (!res.ok) {
                    setError(await readError(res));
                    return;
                }
                const body = await res.json();
                render(body.view, body.weather_error);
            } finally {
                setStatus('');
                $('identify').disabled = false;
            }
        });

        $('refresh-weather').addEventListener('click', async () => {
            $('refresh-weather').disabled = true;
            setStatus('Fetching weather...');
            try {
                const res = await fetch(`/api/sessions/${sessionId}/weather`, { method: 'POST' });
                if (!res.ok) {
                    $('weather').textContent = '';
                    $('weather-error').textContent = await readError(res);
                    return;
                }
                render(await res.json());
            } finally {
                setStatus('');
                $('refresh-weather').disabled = false;
            }
        });

        ensureSession();
    </script>
</body>
</html>
"#;
